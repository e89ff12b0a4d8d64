//! Bill document update operations.
//!
//! Every operation takes the current document by reference and returns a new
//! document value; the input is never mutated, which keeps the engine safe to
//! call repeatedly and trivial to test. Out-of-range numeric input is clamped
//! rather than rejected, matching live-form editing semantics: a user halfway
//! through typing should never see an error from the engine.

use anyhow::Result;
use chrono::Utc;
use log::{debug, info};
use shared::{BillDocument, Currency, Discount, Fee, Item, Member, Split, MEMBER_COLORS};

use crate::domain::commands::bill::{
    AddFeeCommand, AddFeeResult, AddItemCommand, AddItemResult, AddMemberCommand, AddMemberResult,
    ItemUpdate, RemoveFeeCommand, RemoveItemCommand, RemoveItemDiscountCommand,
    RemoveMemberCommand, SetCurrencyCommand, SetItemDiscountCommand, SetItemSharedCommand,
    SetItemSplitCommand, SetOverallDiscountCommand, UpdateItemCommand,
};
use crate::domain::EngineError;

/// Hard ceiling on how many shares an item can be divided into.
pub const MAX_SHARE_COUNT: u32 = 20;

/// Service for editing the bill document: members, items, splits, fees,
/// discounts, and the display currency.
#[derive(Clone, Default)]
pub struct BillService;

impl BillService {
    pub fn new() -> Self {
        Self
    }

    /// Fresh document for a new bill session.
    pub fn new_bill(&self) -> BillDocument {
        BillDocument::new(Utc::now())
    }

    /// Append a member with a fresh id and the next palette color. Blank
    /// names (after trimming) are ignored.
    pub fn add_member(&self, bill: &BillDocument, command: AddMemberCommand) -> Result<AddMemberResult> {
        let name = command.name.trim();
        if name.is_empty() {
            debug!("Ignoring add_member with blank name");
            return Ok(AddMemberResult { bill: bill.clone(), member: None });
        }

        let member = Member {
            id: fresh_id(Member::generate_id, |id| bill.member(id).is_some()),
            name: name.to_string(),
            color_tag: MEMBER_COLORS[bill.members.len() % MEMBER_COLORS.len()].to_string(),
        };
        info!("Adding member {} ({})", member.name, member.id);

        let mut next = bill.clone();
        next.members.push(member.clone());
        touch(&mut next);
        Ok(AddMemberResult { bill: next, member: Some(member) })
    }

    /// Remove a member and strip every split that references it, in one
    /// transformation, so no item is ever left with a dangling claim.
    pub fn remove_member(&self, bill: &BillDocument, command: RemoveMemberCommand) -> Result<BillDocument> {
        if bill.member(&command.member_id).is_none() {
            return Err(EngineError::MemberNotFound(command.member_id).into());
        }
        info!("Removing member {}", command.member_id);

        let mut next = bill.clone();
        next.members.retain(|member| member.id != command.member_id);
        for item in &mut next.items {
            item.splits.retain(|split| split.member_id != command.member_id);
        }
        touch(&mut next);
        Ok(next)
    }

    /// Append an empty item with default values.
    pub fn add_item(&self, bill: &BillDocument, _command: AddItemCommand) -> Result<AddItemResult> {
        let item = Item {
            id: fresh_id(Item::generate_id, |id| bill.item(id).is_some()),
            name: String::new(),
            price: 0.0,
            quantity: 1,
            price_is_total: true,
            shared_qty: 1,
            discount: Discount::default(),
            splits: Vec::new(),
        };
        info!("Adding item {}", item.id);

        let mut next = bill.clone();
        next.items.push(item.clone());
        touch(&mut next);
        Ok(AddItemResult { bill: next, item })
    }

    pub fn remove_item(&self, bill: &BillDocument, command: RemoveItemCommand) -> Result<BillDocument> {
        if bill.item(&command.item_id).is_none() {
            return Err(EngineError::ItemNotFound(command.item_id).into());
        }
        info!("Removing item {}", command.item_id);

        let mut next = bill.clone();
        next.items.retain(|item| item.id != command.item_id);
        touch(&mut next);
        Ok(next)
    }

    /// Validated single-field edit. Prices are clamped to zero and up,
    /// quantities to one and up (and to the share count while the item is
    /// shared). Lowering the claim capacity re-clamps recorded splits so the
    /// claimed total never exceeds it.
    pub fn update_item(&self, bill: &BillDocument, command: UpdateItemCommand) -> Result<BillDocument> {
        let mut next = bill.clone();
        let item = next
            .items
            .iter_mut()
            .find(|item| item.id == command.item_id)
            .ok_or(EngineError::ItemNotFound(command.item_id.clone()))?;

        match command.update {
            ItemUpdate::Name(name) => item.name = name,
            ItemUpdate::Price(price) => item.price = clamp_price(price),
            ItemUpdate::Quantity(quantity) => {
                item.quantity = clamp_quantity(quantity, item.shared_qty);
                clamp_splits_to_capacity(item);
            }
            ItemUpdate::PriceIsTotal(flag) => item.price_is_total = flag,
        }
        debug!("Updated item {}", command.item_id);

        touch(&mut next);
        Ok(next)
    }

    /// Record how much of an item one member claims. The quantity is clamped
    /// to the capacity left over by the other members' claims.
    pub fn set_item_split(&self, bill: &BillDocument, command: SetItemSplitCommand) -> Result<BillDocument> {
        if bill.member(&command.member_id).is_none() {
            return Err(EngineError::MemberNotFound(command.member_id).into());
        }

        let mut next = bill.clone();
        let item = next
            .items
            .iter_mut()
            .find(|item| item.id == command.item_id)
            .ok_or(EngineError::ItemNotFound(command.item_id.clone()))?;

        let others: u32 = item
            .splits
            .iter()
            .filter(|split| split.member_id != command.member_id)
            .map(|split| split.quantity)
            .sum();
        let quantity = command.quantity.min(item.claim_capacity().saturating_sub(others));
        if quantity < command.quantity {
            debug!(
                "Clamped split for {} on {} from {} to {}",
                command.member_id, command.item_id, command.quantity, quantity
            );
        }

        match item.splits.iter_mut().find(|split| split.member_id == command.member_id) {
            Some(split) => split.quantity = quantity,
            None => item.splits.push(Split { member_id: command.member_id.clone(), quantity }),
        }

        touch(&mut next);
        Ok(next)
    }

    /// Divide an item into equal shares (clamped 1..=20). Changing the share
    /// count invalidates prior allocation, so existing splits are reset and
    /// the quantity is capped at the new count.
    pub fn set_item_shared(&self, bill: &BillDocument, command: SetItemSharedCommand) -> Result<BillDocument> {
        let mut next = bill.clone();
        let item = next
            .items
            .iter_mut()
            .find(|item| item.id == command.item_id)
            .ok_or(EngineError::ItemNotFound(command.item_id.clone()))?;

        let share_count = command.share_count.clamp(1, MAX_SHARE_COUNT);
        item.shared_qty = share_count;
        if share_count > 1 {
            item.quantity = item.quantity.min(share_count);
        }
        item.splits.clear();
        info!("Item {} now divided into {} shares", command.item_id, share_count);

        touch(&mut next);
        Ok(next)
    }

    pub fn set_item_discount(&self, bill: &BillDocument, command: SetItemDiscountCommand) -> Result<BillDocument> {
        let mut next = bill.clone();
        let item = next
            .items
            .iter_mut()
            .find(|item| item.id == command.item_id)
            .ok_or(EngineError::ItemNotFound(command.item_id.clone()))?;

        item.discount = command.discount.clamped();
        debug!("Set discount on item {}: {:?}", command.item_id, item.discount);

        touch(&mut next);
        Ok(next)
    }

    pub fn remove_item_discount(&self, bill: &BillDocument, command: RemoveItemDiscountCommand) -> Result<BillDocument> {
        self.set_item_discount(
            bill,
            SetItemDiscountCommand { item_id: command.item_id, discount: Discount::default() },
        )
    }

    /// Append a fee. Blank names or values (after trimming) are ignored,
    /// matching the form's submit behavior.
    pub fn add_fee(&self, bill: &BillDocument, command: AddFeeCommand) -> Result<AddFeeResult> {
        let name = command.name.trim();
        let value = command.value.trim();
        if name.is_empty() || value.is_empty() {
            debug!("Ignoring add_fee with blank name or value");
            return Ok(AddFeeResult { bill: bill.clone(), fee: None });
        }

        let fee = Fee {
            id: fresh_id(Fee::generate_id, |id| bill.fee(id).is_some()),
            name: name.to_string(),
            value: value.to_string(),
            kind: command.kind,
        };
        info!("Adding fee {} ({})", fee.name, fee.id);

        let mut next = bill.clone();
        next.fees.push(fee.clone());
        touch(&mut next);
        Ok(AddFeeResult { bill: next, fee: Some(fee) })
    }

    pub fn remove_fee(&self, bill: &BillDocument, command: RemoveFeeCommand) -> Result<BillDocument> {
        if bill.fee(&command.fee_id).is_none() {
            return Err(EngineError::FeeNotFound(command.fee_id).into());
        }
        info!("Removing fee {}", command.fee_id);

        let mut next = bill.clone();
        next.fees.retain(|fee| fee.id != command.fee_id);
        touch(&mut next);
        Ok(next)
    }

    pub fn set_overall_discount(&self, bill: &BillDocument, command: SetOverallDiscountCommand) -> Result<BillDocument> {
        let mut next = bill.clone();
        next.overall_discount = Some(command.discount.clamped());
        debug!("Set overall discount: {:?}", next.overall_discount);
        touch(&mut next);
        Ok(next)
    }

    pub fn clear_overall_discount(&self, bill: &BillDocument) -> Result<BillDocument> {
        let mut next = bill.clone();
        next.overall_discount = None;
        touch(&mut next);
        Ok(next)
    }

    pub fn set_currency(&self, bill: &BillDocument, command: SetCurrencyCommand) -> Result<BillDocument> {
        let currency =
            Currency::by_code(&command.code).ok_or(EngineError::UnknownCurrency(command.code))?;
        info!("Switching display currency to {}", currency.code);

        let mut next = bill.clone();
        next.currency = currency;
        touch(&mut next);
        Ok(next)
    }
}

fn touch(bill: &mut BillDocument) {
    bill.updated_at = Utc::now();
}

/// Timestamp-based id, bumped forward past any id already in use so two
/// entities created within the same millisecond stay distinct.
fn fresh_id(make: impl Fn(u64) -> String, is_taken: impl Fn(&str) -> bool) -> String {
    let mut millis = Utc::now().timestamp_millis() as u64;
    loop {
        let id = make(millis);
        if !is_taken(&id) {
            return id;
        }
        millis += 1;
    }
}

fn clamp_price(price: f64) -> f64 {
    if price.is_finite() {
        price.max(0.0)
    } else {
        0.0
    }
}

fn clamp_quantity(quantity: u32, shared_qty: u32) -> u32 {
    let quantity = quantity.max(1);
    if shared_qty > 1 {
        quantity.min(shared_qty)
    } else {
        quantity
    }
}

/// Walk splits in roster order, trimming each to whatever capacity is left.
fn clamp_splits_to_capacity(item: &mut Item) {
    let mut remaining = item.claim_capacity();
    for split in &mut item.splits {
        split.quantity = split.quantity.min(remaining);
        remaining -= split.quantity;
    }
}
