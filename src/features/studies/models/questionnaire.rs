use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::shared::constants::{FULL_PARTICIPATION_PCT, PARTICIPATION_TOLERANCE};

/// Intake form filled by the requester
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Questionnaire {
    pub datos_generales: DatosGenerales,
    pub accionistas: Vec<Accionista>,
    pub clientes: Vec<ClienteProveedor>,
    pub proveedores: Vec<ClienteProveedor>,
    pub solicitud: SolicitudCredito,
}

impl Questionnaire {
    /// Sum of shareholder participation percentages
    pub fn total_participation(&self) -> f64 {
        self.accionistas.iter().map(|a| a.participacion).sum()
    }

    pub fn has_full_participation(&self) -> bool {
        (self.total_participation() - FULL_PARTICIPATION_PCT).abs() <= PARTICIPATION_TOLERANCE
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct DatosGenerales {
    pub nombre_empresa: String,
    pub rfc: String,
    pub sector: String,
}

/// Shareholder and its participation percentage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct Accionista {
    pub id: String,
    pub nombre: String,
    pub participacion: f64,
}

/// Main customer or supplier
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ClienteProveedor {
    pub id: String,
    pub nombre: String,
    pub sector: String,
    pub dias_pago: f64,
}

/// Requested lease terms
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct SolicitudCredito {
    pub monto: f64,
    /// Term in months
    pub plazo: f64,
    pub renta: f64,
    pub residual_pct: f64,
    pub opcion_compra_pct: f64,
    pub gastos_originacion_pct: f64,
    pub deposito_garantia_pct: f64,
    pub renta_anticipada_times: f64,
    pub tasa_nominal: f64,
    pub tir: f64,
    pub garantia: String,
}
