use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Display colors cycled through as members are added.
pub const MEMBER_COLORS: [&str; 6] = ["blue", "green", "yellow", "purple", "pink", "indigo"];

/// Member ID in format: "member::<epoch_millis>"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    pub name: String,
    /// Palette color assigned when the member was added
    pub color_tag: String,
}

/// A claim by one member on some quantity (or shares) of an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Split {
    pub member_id: String,
    pub quantity: u32,
}

/// Discount attached to a single item or to the whole bill.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Discount {
    /// Percentage of the base price, 0..=100
    Percentage(f64),
    /// Flat amount, never taking the price below zero
    Amount(f64),
}

impl Default for Discount {
    fn default() -> Self {
        Discount::Percentage(0.0)
    }
}

impl Discount {
    /// Copy of this discount with its value forced into range. Non-finite
    /// values collapse to zero.
    pub fn clamped(self) -> Self {
        match self {
            Discount::Percentage(value) => {
                let value = if value.is_finite() { value.clamp(0.0, 100.0) } else { 0.0 };
                Discount::Percentage(value)
            }
            Discount::Amount(value) => {
                let value = if value.is_finite() { value.max(0.0) } else { 0.0 };
                Discount::Amount(value)
            }
        }
    }

    pub fn is_zero(&self) -> bool {
        let (Discount::Percentage(value) | Discount::Amount(value)) = self;
        !(*value > 0.0)
    }
}

/// One purchased line entry, possibly shared or discounted.
///
/// `price` is the whole line's price when `price_is_total`, a per-unit price
/// otherwise. `shared_qty > 1` marks the item as divided into that many equal
/// shares (a pizza cut into N slices); members then claim shares rather than
/// whole units, and `quantity` is capped at the share count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub quantity: u32,
    pub price_is_total: bool,
    pub shared_qty: u32,
    pub discount: Discount,
    pub splits: Vec<Split>,
}

impl Item {
    /// Maximum total quantity members can claim on this item.
    pub fn claim_capacity(&self) -> u32 {
        if self.shared_qty > 1 {
            self.shared_qty
        } else {
            self.quantity
        }
    }

    /// Sum of all recorded split quantities.
    pub fn claimed_quantity(&self) -> u32 {
        self.splits.iter().map(|split| split.quantity).sum()
    }

    /// Quantity the given member has claimed, zero when no split is recorded.
    pub fn split_quantity_for(&self, member_id: &str) -> u32 {
        self.splits
            .iter()
            .find(|split| split.member_id == member_id)
            .map(|split| split.quantity)
            .unwrap_or(0)
    }
}

/// Whether a fee value is read as a percentage of the pre-fee base or as a
/// flat amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeeKind {
    Percentage,
    Amount,
}

/// A bill-level surcharge such as tax or service charge.
///
/// `value` holds the raw form input; parse it with [`parse_amount`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fee {
    pub id: String,
    pub name: String,
    pub value: String,
    pub kind: FeeKind,
}

/// The whole bill for one session: who is splitting, what was bought, and
/// which surcharges and discounts apply. Transient, owned by the caller, and
/// only ever replaced wholesale by engine operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillDocument {
    pub members: Vec<Member>,
    pub items: Vec<Item>,
    pub fees: Vec<Fee>,
    /// Bill-level discount applied after item discounts, before fees
    pub overall_discount: Option<Discount>,
    pub currency: Currency,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BillDocument {
    /// Empty document stamped with the given creation time.
    pub fn new(created_at: DateTime<Utc>) -> Self {
        Self {
            members: Vec::new(),
            items: Vec::new(),
            fees: Vec::new(),
            overall_discount: None,
            currency: Currency::default(),
            created_at,
            updated_at: created_at,
        }
    }

    pub fn member(&self, member_id: &str) -> Option<&Member> {
        self.members.iter().find(|member| member.id == member_id)
    }

    pub fn item(&self, item_id: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.id == item_id)
    }

    pub fn fee(&self, fee_id: &str) -> Option<&Fee> {
        self.fees.iter().find(|fee| fee.id == fee_id)
    }
}

impl Default for BillDocument {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

/// Display currency. Zero-decimal currencies render whole units with
/// thousands grouping; the rest render with two decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    pub code: String,
    pub symbol: String,
    pub name: String,
    pub zero_decimal: bool,
}

impl Currency {
    fn make(code: &str, symbol: &str, name: &str, zero_decimal: bool) -> Self {
        Self {
            code: code.to_string(),
            symbol: symbol.to_string(),
            name: name.to_string(),
            zero_decimal,
        }
    }

    /// The currencies offered by the picker.
    pub fn catalogue() -> Vec<Currency> {
        vec![
            Currency::make("IDR", "Rp", "Indonesian Rupiah", true),
            Currency::make("USD", "$", "US Dollar", false),
            Currency::make("EUR", "€", "Euro", false),
            Currency::make("GBP", "£", "British Pound", false),
            Currency::make("SGD", "S$", "Singapore Dollar", false),
        ]
    }

    pub fn by_code(code: &str) -> Option<Currency> {
        Currency::catalogue().into_iter().find(|currency| currency.code == code)
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::make("IDR", "Rp", "Indonesian Rupiah", true)
    }
}

/// Format an amount for display in the given currency. Presentational only;
/// the engine never consumes formatted strings.
pub fn format_amount(currency: &Currency, amount: f64) -> String {
    if !amount.is_finite() {
        return format!("{}0", currency.symbol);
    }
    if currency.zero_decimal {
        format!("{} {}", currency.symbol, group_thousands(amount.round() as i64))
    } else {
        format!("{}{:.2}", currency.symbol, amount)
    }
}

fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }
    let lead = digits.len() % 3;
    for (index, digit) in digits.chars().enumerate() {
        if index != 0 && index % 3 == lead % 3 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

/// Lenient numeric parsing for live form input: malformed or non-finite
/// values fall back to zero instead of failing.
pub fn parse_amount(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

impl Member {
    /// Generate a member ID from a timestamp
    pub fn generate_id(epoch_millis: u64) -> String {
        format!("member::{}", epoch_millis)
    }

    pub fn parse_id(id: &str) -> Result<u64, IdError> {
        parse_tagged_id(id, "member")
    }
}

impl Item {
    /// Generate an item ID from a timestamp
    pub fn generate_id(epoch_millis: u64) -> String {
        format!("item::{}", epoch_millis)
    }

    pub fn parse_id(id: &str) -> Result<u64, IdError> {
        parse_tagged_id(id, "item")
    }
}

impl Fee {
    /// Generate a fee ID from a timestamp
    pub fn generate_id(epoch_millis: u64) -> String {
        format!("fee::{}", epoch_millis)
    }

    pub fn parse_id(id: &str) -> Result<u64, IdError> {
        parse_tagged_id(id, "fee")
    }
}

fn parse_tagged_id(id: &str, tag: &str) -> Result<u64, IdError> {
    let parts: Vec<&str> = id.split("::").collect();
    if parts.len() != 2 || parts[0] != tag {
        return Err(IdError::InvalidFormat);
    }
    parts[1].parse::<u64>().map_err(|_| IdError::InvalidTimestamp)
}

#[derive(Debug, Clone, PartialEq)]
pub enum IdError {
    InvalidFormat,
    InvalidTimestamp,
}

impl fmt::Display for IdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdError::InvalidFormat => write!(f, "Invalid ID format"),
            IdError::InvalidTimestamp => write!(f, "Invalid timestamp in ID"),
        }
    }
}

impl std::error::Error for IdError {}

/// One item-level discount row in the bill summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountLine {
    pub item_id: String,
    pub item_name: String,
    pub amount: f64,
}

/// One fee row in the bill summary, with its resolved monetary amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeLine {
    pub fee_id: String,
    pub name: String,
    pub kind: FeeKind,
    pub amount: f64,
}

/// Everything the summary panel renders: the pre-discount subtotal, the
/// discount and fee breakdowns, and the grand total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillSummary {
    pub subtotal: f64,
    pub item_discounts: Vec<DiscountLine>,
    pub subtotal_after_item_discounts: f64,
    pub overall_discount_amount: f64,
    pub net_before_fees: f64,
    pub fees: Vec<FeeLine>,
    pub total: f64,
}

/// One member's computed share of the total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberShare {
    pub member_id: String,
    pub name: String,
    pub color_tag: String,
    pub amount: f64,
}

/// Result of checking the grand total against the summed member shares.
/// Informational: drift legitimately arises from unclaimed quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub total: f64,
    pub share_sum: f64,
    /// total − share_sum; positive when the shares under-cover the bill
    pub difference: f64,
    pub matches: bool,
}
