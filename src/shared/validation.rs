use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Mexican RFC (tax id): 3 letters for companies or 4 for individuals,
    /// a YYMMDD date and a 3-character homoclave.
    /// - Valid: "ABC200101XY1", "GODE561231GR8", "AB&200101XY1"
    /// - Invalid: "ABC2001011XY", "abc200101xy1", "ABC-200101-XY1"
    pub static ref RFC_REGEX: Regex =
        Regex::new(r"^[A-ZÑ&]{3,4}[0-9]{2}(0[1-9]|1[0-2])(0[1-9]|[12][0-9]|3[01])[A-Z0-9]{3}$")
            .unwrap();

    /// Document slot names double as field-path segments (`files.<slot>`)
    /// - Valid: "anexosPDF", "estadosFinancierosAnual1"
    /// - Invalid: "1slot", "files.x", "slot-name", ""
    pub static ref DOCUMENT_SLOT_REGEX: Regex = Regex::new(r"^[A-Za-z][A-Za-z0-9]{0,63}$").unwrap();

    /// One segment of a dotted document field path
    pub static ref FIELD_SEGMENT_REGEX: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,63}$").unwrap();

    /// Warehouse project, dataset or table name interpolated into view SQL
    /// - Valid: "credit-iq", "analisis_credit_iq"
    /// - Invalid: "a.b", "x`; DROP", ""
    pub static ref WAREHOUSE_IDENTIFIER_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_-]{1,128}$").unwrap();
}

/// Check an RFC after normalising case and surrounding whitespace.
pub fn is_valid_rfc(rfc: &str) -> bool {
    RFC_REGEX.is_match(&rfc.trim().to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc_regex_valid() {
        assert!(is_valid_rfc("ABC200101XY1"));
        assert!(is_valid_rfc("GODE561231GR8"));
        assert!(is_valid_rfc("abc200101xy1")); // normalised
        assert!(is_valid_rfc(" AB&200101XY1 "));
    }

    #[test]
    fn test_rfc_regex_invalid() {
        assert!(!is_valid_rfc("ABC2001011XY")); // date too long
        assert!(!is_valid_rfc("ABC201301XY1")); // month 13
        assert!(!is_valid_rfc("ABC-200101-XY1"));
        assert!(!is_valid_rfc(""));
    }

    #[test]
    fn test_document_slot_regex() {
        assert!(DOCUMENT_SLOT_REGEX.is_match("anexosPDF"));
        assert!(DOCUMENT_SLOT_REGEX.is_match("estadosFinancierosAnual1"));
        assert!(!DOCUMENT_SLOT_REGEX.is_match("1slot"));
        assert!(!DOCUMENT_SLOT_REGEX.is_match("files.x"));
        assert!(!DOCUMENT_SLOT_REGEX.is_match("slot-name"));
        assert!(!DOCUMENT_SLOT_REGEX.is_match(""));
    }

    #[test]
    fn test_field_segment_regex() {
        assert!(FIELD_SEGMENT_REGEX.is_match("reputationData"));
        assert!(FIELD_SEGMENT_REGEX.is_match("_private"));
        assert!(!FIELD_SEGMENT_REGEX.is_match("a.b"));
        assert!(!FIELD_SEGMENT_REGEX.is_match("{0}"));
    }

    #[test]
    fn test_warehouse_identifier_regex() {
        assert!(WAREHOUSE_IDENTIFIER_REGEX.is_match("credit-iq"));
        assert!(WAREHOUSE_IDENTIFIER_REGEX.is_match("solicitudes_raw_latest"));
        assert!(!WAREHOUSE_IDENTIFIER_REGEX.is_match("a.b"));
        assert!(!WAREHOUSE_IDENTIFIER_REGEX.is_match("x`; DROP"));
        assert!(!WAREHOUSE_IDENTIFIER_REGEX.is_match(""));
    }
}
