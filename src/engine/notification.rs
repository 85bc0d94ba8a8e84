use crate::models::{EmailQueuePayload, ExecutionRecord, Order, OrderSide, TradeNotice};
use crate::utils::format::{format_date_time, format_grouped};

/// Email type for executed orders
pub const ORDER_EXECUTED: &str = "order_executed";

/// Build the trade notice of one executed leg
///
/// `symbol` is the display symbol of the pair's base coin.
pub fn trade_notice(record: &ExecutionRecord, order: &Order, symbol: &str) -> TradeNotice {
    let (kind, type_uppercase) = match record.side {
        OrderSide::Sell => ("venda", "VENDA"),
        OrderSide::Buy => ("compra", "COMPRA"),
    };

    TradeNotice {
        kind: kind.to_string(),
        type_uppercase: type_uppercase.to_string(),
        amount: format_grouped(record.amount_executed, 8),
        pair: record.pair.to_uppercase(),
        symbol: symbol.to_string(),
        price: format_grouped(record.price_unity, 2),
        order_id: order.identificator.clone(),
        total: format_grouped(record.total, 2),
        date_time: format_date_time(record.time_executed),
    }
}

/// Build the email queue payload for one executed leg
pub fn email_payload(
    record: &ExecutionRecord,
    order: &Order,
    symbol: &str,
) -> Result<EmailQueuePayload, serde_json::Error> {
    let information = serde_json::to_string(&trade_notice(record, order, symbol))?;

    Ok(EmailQueuePayload {
        kind: ORDER_EXECUTED.to_string(),
        user_id: record.user_id,
        information,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewExecutionRecord;
    use crate::testing::{base_time, OrderBuilder};
    use rust_decimal_macros::dec;

    fn record(side: OrderSide) -> ExecutionRecord {
        NewExecutionRecord {
            execution_id: "abc".to_string(),
            int_done: true,
            order_id: 1,
            side,
            pair: "btc/brl".to_string(),
            user_id: 42,
            price_unity: dec!(250000.5),
            order_amount: dec!(0.5),
            amount_executed: dec!(0.5),
            fee: dec!(0.0005),
            amount_left: dec!(0),
            total: dec!(125000.25),
            time_executed: base_time(),
            done_with: None,
        }
        .into_record(3)
    }

    #[test]
    fn test_trade_notice_formatting() {
        let order = OrderBuilder::limit_sell(1, dec!(250000.5), dec!(0.5)).build();
        let notice = trade_notice(&record(OrderSide::Sell), &order, "₿");

        assert_eq!(notice.kind, "venda");
        assert_eq!(notice.type_uppercase, "VENDA");
        assert_eq!(notice.amount, "0,50000000");
        assert_eq!(notice.pair, "BTC/BRL");
        assert_eq!(notice.symbol, "₿");
        assert_eq!(notice.price, "250.000,50");
        assert_eq!(notice.order_id, "ord-1");
        assert_eq!(notice.total, "125.000,25");
        assert_eq!(notice.date_time, "01/01/2024 12:00");
    }

    #[test]
    fn test_email_payload_wraps_notice_as_json() {
        let order = OrderBuilder::limit_buy(1, dec!(250000.5), dec!(0.5)).build();
        let payload = email_payload(&record(OrderSide::Buy), &order, "₿").unwrap();

        assert_eq!(payload.kind, ORDER_EXECUTED);
        assert_eq!(payload.user_id, 42);

        let info: serde_json::Value = serde_json::from_str(&payload.information).unwrap();
        assert_eq!(info["type"], "compra");
        assert_eq!(info["type_uppercase"], "COMPRA");
        assert_eq!(info["order_id"], "ord-1");
    }
}
