//! # Split-Bill Allocation Engine
//!
//! Pure domain services over a [`shared::BillDocument`]: pricing and
//! aggregation, per-member allocation, reconciliation, and the validated
//! update operations the UI layer drives. Compared to the UI layer, this
//! engine:
//! - Is synchronous and stateless (every call is a full re-evaluation)
//! - Never mutates its inputs; update operations return a new document value
//! - Never fails on read operations; malformed numeric input falls back to zero

use shared::BillDocument;

pub mod domain;

pub use domain::allocation_service::AllocationService;
pub use domain::bill_service::BillService;
pub use domain::pricing_service::PricingService;
pub use domain::EngineError;

/// Main engine struct that bundles all domain services
pub struct BillEngine {
    pub bill_service: BillService,
    pub pricing_service: PricingService,
    pub allocation_service: AllocationService,
}

impl BillEngine {
    /// Create a new engine instance with all services
    pub fn new() -> Self {
        let pricing_service = PricingService::new();
        let allocation_service = AllocationService::new(pricing_service.clone());
        Self {
            bill_service: BillService::new(),
            pricing_service,
            allocation_service,
        }
    }

    /// Fresh, empty bill document for a new session.
    pub fn new_document(&self) -> BillDocument {
        self.bill_service.new_bill()
    }
}

impl Default for BillEngine {
    fn default() -> Self {
        Self::new()
    }
}
