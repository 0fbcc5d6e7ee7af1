// =============================================================================
// ROLE CONSTANTS
// =============================================================================

/// Admin role - manages users and every study
pub const ROLE_ADMIN: &str = "admin";

/// Reviewer role - runs scoring jobs and decides on studies
pub const ROLE_REVIEWER: &str = "reviewer";

/// Requester role - submits studies for their own companies
pub const ROLE_REQUESTER: &str = "requester";

// =============================================================================
// STUDY DOCUMENTS
// =============================================================================

/// Document slots every new study starts with (all empty)
pub const STANDARD_DOCUMENT_SLOTS: &[&str] = &[
    "estadosFinancierosAnual1",
    "estadosFinancierosAnual2",
    "estadosFinancierosAnual3",
    "estadosFinancierosInterinoActual",
    "estadosFinancierosInterinoComparativo",
    "estadosFinancierosInterinoAnterior",
    "anexosPDF",
];

/// Allowed MIME types for study documents
pub const ALLOWED_DOCUMENT_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-excel",
    "text/csv",
    "image/jpeg",
    "image/png",
];

/// Maximum document size in bytes (20MB)
pub const MAX_DOCUMENT_SIZE: usize = 20 * 1024 * 1024;

/// Shareholder participation must add up to this, within `PARTICIPATION_TOLERANCE`
pub const FULL_PARTICIPATION_PCT: f64 = 100.0;
pub const PARTICIPATION_TOLERANCE: f64 = 0.01;

/// Header carrying the scoring secret key on outbound jobs and inbound callbacks
pub const SCORING_API_KEY_HEADER: &str = "x-api-key";

/// Header carrying the HMAC-SHA256 of the outbound job body
pub const SCORING_SIGNATURE_HEADER: &str = "x-credit-iq-signature";
