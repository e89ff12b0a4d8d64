//! Commands and results for bill document updates.
//!
//! Every command is applied against a caller-owned document and yields a new
//! document value; results carry the replacement document plus whatever the
//! caller needs to follow up (freshly created entities, mostly).

use serde::{Deserialize, Serialize};
use shared::{BillDocument, Discount, Fee, FeeKind, Item, Member};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddMemberCommand {
    pub name: String,
}

/// `member` is `None` when the command was a no-op (blank name).
#[derive(Debug, Clone)]
pub struct AddMemberResult {
    pub bill: BillDocument,
    pub member: Option<Member>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveMemberCommand {
    pub member_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddItemCommand;

#[derive(Debug, Clone)]
pub struct AddItemResult {
    pub bill: BillDocument,
    pub item: Item,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveItemCommand {
    pub item_id: String,
}

/// Single-field item edit, mirroring one form input changing at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ItemUpdate {
    Name(String),
    Price(f64),
    Quantity(u32),
    PriceIsTotal(bool),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateItemCommand {
    pub item_id: String,
    pub update: ItemUpdate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetItemSplitCommand {
    pub item_id: String,
    pub member_id: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetItemSharedCommand {
    pub item_id: String,
    pub share_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetItemDiscountCommand {
    pub item_id: String,
    pub discount: Discount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveItemDiscountCommand {
    pub item_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddFeeCommand {
    pub name: String,
    pub value: String,
    pub kind: FeeKind,
}

/// `fee` is `None` when the command was a no-op (blank name or value).
#[derive(Debug, Clone)]
pub struct AddFeeResult {
    pub bill: BillDocument,
    pub fee: Option<Fee>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveFeeCommand {
    pub fee_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetOverallDiscountCommand {
    pub discount: Discount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetCurrencyCommand {
    pub code: String,
}
