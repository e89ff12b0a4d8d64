//! Per-member allocation and reconciliation.
//!
//! A member's share starts from their claimed slice of each item's
//! discounted value, takes a proportional cut of the bill-level discount,
//! then picks up fees: percentage fees scale with the member's own
//! post-discount subtotal, flat fees split equally across the roster
//! regardless of consumption.

use log::debug;
use shared::{parse_amount, BillDocument, FeeKind, Item, MemberShare, ReconcileReport};

use crate::domain::pricing_service::PricingService;

/// Currency-unit tolerance when comparing the total against summed shares.
pub const RECONCILE_EPSILON: f64 = 0.01;

/// Service computing per-member shares and the reconciliation diagnostic.
#[derive(Clone, Default)]
pub struct AllocationService {
    pricing: PricingService,
}

impl AllocationService {
    pub fn new(pricing: PricingService) -> Self {
        Self { pricing }
    }

    /// One member's fair share of the grand total.
    pub fn member_share(&self, bill: &BillDocument, member_id: &str) -> f64 {
        let mut member_subtotal: f64 = bill
            .items
            .iter()
            .map(|item| self.item_portion(item, member_id))
            .sum();

        // proportional cut of the bill-level discount
        let after_item_discounts = self.pricing.subtotal_after_item_discounts(bill);
        if after_item_discounts > 0.0 {
            member_subtotal -=
                self.pricing.overall_discount_amount(bill) * member_subtotal / after_item_discounts;
        }

        let mut share = member_subtotal;
        for fee in &bill.fees {
            let value = parse_amount(&fee.value).max(0.0);
            match fee.kind {
                FeeKind::Percentage => share += member_subtotal * value / 100.0,
                FeeKind::Amount => {
                    if !bill.members.is_empty() {
                        share += value / bill.members.len() as f64;
                    }
                }
            }
        }
        share
    }

    /// The member's slice of one item's discounted value.
    ///
    /// Shared items price by share; unshared items distribute the line value
    /// proportionally to claimed quantity, falling back to the full line
    /// quantity when nothing is recorded.
    fn item_portion(&self, item: &Item, member_id: &str) -> f64 {
        let claimed = item.split_quantity_for(member_id);
        if claimed == 0 {
            return 0.0;
        }
        if item.shared_qty > 1 {
            return self.pricing.effective_share_price(item) * f64::from(claimed);
        }
        let pool = match item.claimed_quantity() {
            0 => item.quantity,
            claimed_total => claimed_total,
        };
        if pool == 0 {
            return 0.0;
        }
        self.pricing.effective_line_price(item) * f64::from(claimed) / f64::from(pool)
    }

    /// Shares for the whole roster, in roster order.
    pub fn member_shares(&self, bill: &BillDocument) -> Vec<MemberShare> {
        bill.members
            .iter()
            .map(|member| MemberShare {
                member_id: member.id.clone(),
                name: member.name.clone(),
                color_tag: member.color_tag.clone(),
                amount: self.member_share(bill, &member.id),
            })
            .collect()
    }

    /// Compare the grand total against the summed member shares. Reported,
    /// never auto-corrected: drift legitimately arises when claimed
    /// quantities don't cover the whole bill.
    pub fn reconcile(&self, bill: &BillDocument) -> ReconcileReport {
        let total = self.pricing.total(bill);
        let share_sum: f64 = bill
            .members
            .iter()
            .map(|member| self.member_share(bill, &member.id))
            .sum();
        let difference = total - share_sum;
        let matches = difference.abs() <= RECONCILE_EPSILON;
        if !matches {
            debug!("Reconciliation drift: total={total:.2} shares={share_sum:.2}");
        }
        ReconcileReport { total, share_sum, difference, matches }
    }
}
