//! Pricing and aggregation over a bill document.
//!
//! Monetary figures flow in one direction: per-item base value, then item
//! discounts, then the bill-level discount, then fees. Every percentage fee
//! references the same pre-fee base, so fees are additive and their
//! declaration order never changes the total.

use log::debug;
use shared::{
    parse_amount, BillDocument, BillSummary, Discount, DiscountLine, Fee, FeeKind, FeeLine, Item,
};

/// Service for per-item pricing and whole-bill aggregation.
#[derive(Clone, Default)]
pub struct PricingService;

impl PricingService {
    pub fn new() -> Self {
        Self
    }

    /// Pre-discount total value of a line: the price itself when it already
    /// covers the whole line, price times quantity otherwise.
    pub fn line_base(&self, item: &Item) -> f64 {
        let price = if item.price.is_finite() { item.price.max(0.0) } else { 0.0 };
        if item.price_is_total {
            price
        } else {
            price * f64::from(item.quantity)
        }
    }

    /// Line value after the item's own discount. Never divided by the share
    /// count; use [`PricingService::effective_share_price`] for one share.
    pub fn effective_line_price(&self, item: &Item) -> f64 {
        let base = self.line_base(item);
        match item.discount.clamped() {
            Discount::Percentage(pct) => base * (1.0 - pct / 100.0),
            Discount::Amount(amount) => (base - amount).max(0.0),
        }
    }

    /// Price of one share of a shared item. The discounted line value is
    /// divided by the share count exactly once, here.
    pub fn effective_share_price(&self, item: &Item) -> f64 {
        self.effective_line_price(item) / f64::from(item.shared_qty.max(1))
    }

    /// Monetary value of the item's own discount, against the same base as
    /// [`PricingService::line_base`].
    pub fn item_discount_amount(&self, item: &Item) -> f64 {
        let base = self.line_base(item);
        match item.discount.clamped() {
            Discount::Percentage(pct) => base * pct / 100.0,
            Discount::Amount(amount) => amount.min(base),
        }
    }

    /// Pre-discount subtotal: the sum of every line's base value.
    pub fn subtotal(&self, bill: &BillDocument) -> f64 {
        bill.items.iter().map(|item| self.line_base(item)).sum()
    }

    pub fn subtotal_after_item_discounts(&self, bill: &BillDocument) -> f64 {
        let discounts: f64 = bill.items.iter().map(|item| self.item_discount_amount(item)).sum();
        self.subtotal(bill) - discounts
    }

    /// Bill-level discount amount, resolved against the post-item-discount
    /// subtotal. Flat amounts never take the subtotal negative.
    pub fn overall_discount_amount(&self, bill: &BillDocument) -> f64 {
        let after_item_discounts = self.subtotal_after_item_discounts(bill);
        match bill.overall_discount.map(Discount::clamped) {
            Some(Discount::Percentage(pct)) => after_item_discounts * pct / 100.0,
            Some(Discount::Amount(amount)) => amount.min(after_item_discounts),
            None => 0.0,
        }
    }

    /// The base every percentage fee is computed against.
    pub fn net_before_fees(&self, bill: &BillDocument) -> f64 {
        self.subtotal_after_item_discounts(bill) - self.overall_discount_amount(bill)
    }

    /// Monetary amount a single fee adds to the bill.
    pub fn fee_amount(&self, bill: &BillDocument, fee: &Fee) -> f64 {
        let value = parse_amount(&fee.value).max(0.0);
        match fee.kind {
            FeeKind::Percentage => self.net_before_fees(bill) * value / 100.0,
            FeeKind::Amount => value,
        }
    }

    /// Grand total: net of all discounts, plus every fee.
    pub fn total(&self, bill: &BillDocument) -> f64 {
        let fees: f64 = bill.fees.iter().map(|fee| self.fee_amount(bill, fee)).sum();
        self.net_before_fees(bill) + fees
    }

    /// Full breakdown for the summary panel.
    pub fn summarize(&self, bill: &BillDocument) -> BillSummary {
        let item_discounts: Vec<DiscountLine> = bill
            .items
            .iter()
            .filter(|item| !item.discount.is_zero())
            .map(|item| DiscountLine {
                item_id: item.id.clone(),
                item_name: item.name.clone(),
                amount: self.item_discount_amount(item),
            })
            .collect();
        let fees: Vec<FeeLine> = bill
            .fees
            .iter()
            .map(|fee| FeeLine {
                fee_id: fee.id.clone(),
                name: fee.name.clone(),
                kind: fee.kind,
                amount: self.fee_amount(bill, fee),
            })
            .collect();

        let summary = BillSummary {
            subtotal: self.subtotal(bill),
            item_discounts,
            subtotal_after_item_discounts: self.subtotal_after_item_discounts(bill),
            overall_discount_amount: self.overall_discount_amount(bill),
            net_before_fees: self.net_before_fees(bill),
            fees,
            total: self.total(bill),
        };
        debug!(
            "Summarized bill: subtotal={:.2} total={:.2}",
            summary.subtotal, summary.total
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{Fee, FeeKind, Member, Split};

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    fn item(id: u64, price: f64) -> Item {
        Item {
            id: Item::generate_id(id),
            name: format!("Item {id}"),
            price,
            quantity: 1,
            price_is_total: true,
            shared_qty: 1,
            discount: Discount::default(),
            splits: Vec::new(),
        }
    }

    fn fee(id: u64, value: &str, kind: FeeKind) -> Fee {
        Fee {
            id: Fee::generate_id(id),
            name: format!("Fee {id}"),
            value: value.to_string(),
            kind,
        }
    }

    fn bill_with_items(items: Vec<Item>) -> BillDocument {
        BillDocument { items, ..BillDocument::default() }
    }

    #[test]
    fn test_line_base_respects_price_is_total() {
        let pricing = PricingService::new();

        let total_priced = item(1, 400.0);
        assert_close(pricing.line_base(&total_priced), 400.0);

        let mut unit_priced = item(2, 25.0);
        unit_priced.price_is_total = false;
        unit_priced.quantity = 4;
        assert_close(pricing.line_base(&unit_priced), 100.0);
    }

    #[test]
    fn test_line_base_ignores_garbage_prices() {
        let pricing = PricingService::new();

        let mut broken = item(1, f64::NAN);
        assert_close(pricing.line_base(&broken), 0.0);
        broken.price = -50.0;
        assert_close(pricing.line_base(&broken), 0.0);
    }

    #[test]
    fn test_effective_line_price_percentage_discount() {
        let pricing = PricingService::new();
        let mut discounted = item(1, 100.0);
        discounted.discount = Discount::Percentage(20.0);

        assert_close(pricing.effective_line_price(&discounted), 80.0);
        assert_close(pricing.item_discount_amount(&discounted), 20.0);
    }

    #[test]
    fn test_effective_line_price_amount_discount_floors_at_zero() {
        let pricing = PricingService::new();
        let mut discounted = item(1, 30.0);
        discounted.discount = Discount::Amount(45.0);

        assert_close(pricing.effective_line_price(&discounted), 0.0);
        // the discount amount shown never exceeds the line value
        assert_close(pricing.item_discount_amount(&discounted), 30.0);
    }

    #[test]
    fn test_share_price_divides_exactly_once() {
        let pricing = PricingService::new();
        let mut pizza = item(1, 400.0);
        pizza.shared_qty = 4;

        assert_close(pricing.effective_line_price(&pizza), 400.0);
        assert_close(pricing.effective_share_price(&pizza), 100.0);
    }

    #[test]
    fn test_discount_applies_before_share_division() {
        let pricing = PricingService::new();
        let mut pizza = item(1, 400.0);
        pizza.shared_qty = 4;
        pizza.discount = Discount::Percentage(50.0);

        assert_close(pricing.effective_share_price(&pizza), 50.0);
    }

    #[test]
    fn test_subtotal_is_pre_discount_baseline() {
        let pricing = PricingService::new();
        let mut discounted = item(2, 200.0);
        discounted.discount = Discount::Percentage(50.0);
        let bill = bill_with_items(vec![item(1, 100.0), discounted]);

        assert_close(pricing.subtotal(&bill), 300.0);
        assert_close(pricing.subtotal_after_item_discounts(&bill), 200.0);
    }

    #[test]
    fn test_overall_discount_amount_caps_at_subtotal() {
        let pricing = PricingService::new();
        let mut bill = bill_with_items(vec![item(1, 100.0)]);

        bill.overall_discount = Some(Discount::Percentage(10.0));
        assert_close(pricing.overall_discount_amount(&bill), 10.0);
        assert_close(pricing.net_before_fees(&bill), 90.0);

        bill.overall_discount = Some(Discount::Amount(250.0));
        assert_close(pricing.overall_discount_amount(&bill), 100.0);
        assert_close(pricing.net_before_fees(&bill), 0.0);
    }

    #[test]
    fn test_percentage_fees_reference_the_pre_fee_base() {
        let pricing = PricingService::new();
        let mut bill = bill_with_items(vec![item(1, 1000.0)]);
        bill.fees.push(fee(1, "10", FeeKind::Percentage));
        bill.fees.push(fee(2, "5", FeeKind::Percentage));

        // 1000 + 100 + 50, not 1000 * 1.10 * 1.05
        assert_close(pricing.total(&bill), 1150.0);
    }

    #[test]
    fn test_fee_order_is_commutative() {
        let pricing = PricingService::new();
        let mut bill = bill_with_items(vec![item(1, 800.0)]);
        bill.fees.push(fee(1, "10", FeeKind::Percentage));
        bill.fees.push(fee(2, "25", FeeKind::Amount));
        bill.fees.push(fee(3, "2.5", FeeKind::Percentage));

        let total = pricing.total(&bill);
        bill.fees.reverse();
        assert_close(pricing.total(&bill), total);
        bill.fees.swap(0, 1);
        assert_close(pricing.total(&bill), total);
    }

    #[test]
    fn test_fee_amount_is_lenient_about_input() {
        let pricing = PricingService::new();
        let bill = bill_with_items(vec![item(1, 100.0)]);

        assert_close(pricing.fee_amount(&bill, &fee(1, "abc", FeeKind::Percentage)), 0.0);
        assert_close(pricing.fee_amount(&bill, &fee(2, "-10", FeeKind::Amount)), 0.0);
        assert_close(pricing.fee_amount(&bill, &fee(3, " 7 ", FeeKind::Amount)), 7.0);
    }

    #[test]
    fn test_total_with_discounts_and_fees() {
        let pricing = PricingService::new();
        let mut discounted = item(1, 500.0);
        discounted.discount = Discount::Amount(100.0);
        let mut bill = bill_with_items(vec![discounted, item(2, 600.0)]);
        bill.overall_discount = Some(Discount::Percentage(10.0));
        bill.fees.push(fee(1, "10", FeeKind::Percentage));
        bill.fees.push(fee(2, "20", FeeKind::Amount));

        // subtotal 1100, after item discounts 1000, overall -100 -> 900
        // +10% of 900 +20 flat
        assert_close(pricing.total(&bill), 1010.0);
    }

    #[test]
    fn test_empty_bill_totals_to_zero() {
        let pricing = PricingService::new();
        let mut bill = BillDocument::default();
        bill.overall_discount = Some(Discount::Percentage(10.0));
        bill.fees.push(fee(1, "10", FeeKind::Percentage));

        assert_close(pricing.subtotal(&bill), 0.0);
        assert_close(pricing.total(&bill), 0.0);
    }

    #[test]
    fn test_summarize_breakdown() {
        let pricing = PricingService::new();
        let mut discounted = item(1, 200.0);
        discounted.name = "Pizza".to_string();
        discounted.discount = Discount::Percentage(25.0);
        let mut bill = bill_with_items(vec![discounted, item(2, 100.0)]);
        bill.members.push(Member {
            id: Member::generate_id(1),
            name: "Ana".to_string(),
            color_tag: "blue".to_string(),
        });
        bill.items[0].splits.push(Split { member_id: Member::generate_id(1), quantity: 1 });
        bill.fees.push(fee(1, "10", FeeKind::Percentage));

        let summary = pricing.summarize(&bill);
        assert_close(summary.subtotal, 300.0);
        assert_eq!(summary.item_discounts.len(), 1);
        assert_eq!(summary.item_discounts[0].item_name, "Pizza");
        assert_close(summary.item_discounts[0].amount, 50.0);
        assert_close(summary.subtotal_after_item_discounts, 250.0);
        assert_close(summary.overall_discount_amount, 0.0);
        assert_close(summary.net_before_fees, 250.0);
        assert_eq!(summary.fees.len(), 1);
        assert_close(summary.fees[0].amount, 25.0);
        assert_close(summary.total, 275.0);
    }
}
