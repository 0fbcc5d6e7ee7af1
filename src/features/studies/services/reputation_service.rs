use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::core::error::Result;
use crate::features::studies::models::{ReputationData, Study};

/// Produces the reputational analysis merged into a study after submission
#[async_trait]
pub trait ReputationProvider: Send + Sync {
    async fn analyze(&self, study: &Study) -> Result<ReputationData>;
}

/// Impact bounds, in credit score points
const MAX_IMPACT: i32 = 20;
const CLASSIFICATION_THRESHOLD: i32 = 5;

/// Stand-in for the web reputation scan: derives a stable impact from a
/// SHA-256 digest of the company name and RFC.
#[derive(Debug, Default, Clone, Copy)]
pub struct DigestReputationProvider;

impl DigestReputationProvider {
    /// Impact in `[-MAX_IMPACT, MAX_IMPACT]`
    pub fn impact_for(empresa: &str, rfc: &str) -> i32 {
        let key = format!(
            "{}|{}",
            empresa.trim().to_uppercase(),
            rfc.trim().to_uppercase()
        );
        let digest = Sha256::digest(key.as_bytes());
        let seed = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
        let span = (2 * MAX_IMPACT + 1) as u32;
        (seed % span) as i32 - MAX_IMPACT
    }

    pub fn classify(impact: i32) -> &'static str {
        if impact > CLASSIFICATION_THRESHOLD {
            "positiva"
        } else if impact < -CLASSIFICATION_THRESHOLD {
            "negativa"
        } else {
            "neutral"
        }
    }

    pub fn label(impact: i32) -> String {
        if impact >= 0 {
            format!("Positivo (+{} pts)", impact)
        } else {
            format!("Negativo ({} pts)", impact)
        }
    }
}

#[async_trait]
impl ReputationProvider for DigestReputationProvider {
    async fn analyze(&self, study: &Study) -> Result<ReputationData> {
        let document = &study.document;
        let empresa = if document.empresa_nombre.trim().is_empty() {
            document.questionnaire.datos_generales.nombre_empresa.clone()
        } else {
            document.empresa_nombre.clone()
        };

        let impact = Self::impact_for(&empresa, &document.rfc);
        let calificacion = Self::classify(impact);

        let resumen = match calificacion {
            "positiva" => "Cobertura en medios financieros favorable y sin litigios relevantes.",
            "negativa" => "Se detectaron menciones adversas en medios y registros públicos.",
            _ => "Presencia mediática estable sin señales relevantes.",
        };

        Ok(ReputationData {
            empresa,
            calificacion_reputacional: calificacion.to_string(),
            impacto_score_crediticio: Self::label(impact),
            impacto_score_num: impact,
            resumen_reputacional: resumen.to_string(),
            riesgos: vec!["Presión competitiva sectorial.".to_string()],
            oportunidades: vec!["Expansión digital detectada.".to_string()],
            fuentes: vec!["Forbes".to_string(), "El Economista".to_string()],
        })
    }
}
