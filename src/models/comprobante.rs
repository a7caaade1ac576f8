//! DIAN electronic-payroll voucher ("comprobante").

use serde::{Deserialize, Serialize};

/// One employee's electronic-payroll document within a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comprobante {
    pub secuencia: i64,
    #[serde(default)]
    pub empleado: Option<serde_json::Value>,
    #[serde(default)]
    pub nombre_empleado: Option<String>,
    #[serde(default)]
    pub consecutivo: Option<i64>,
    #[serde(default)]
    pub marcacion: Option<String>,
    #[serde(default)]
    pub cune: Option<String>,
    #[serde(default)]
    pub prefijo: Option<String>,
    #[serde(default)]
    pub numerocomprobantedian: Option<serde_json::Value>,
    #[serde(default)]
    pub fechapago: Option<String>,
    #[serde(default)]
    pub devengadototal: Option<f64>,
    #[serde(default)]
    pub deducidototal: Option<f64>,
    #[serde(default)]
    pub redondeototal: Option<f64>,
    #[serde(default)]
    pub comprobantetotal: Option<f64>,
    #[serde(default)]
    pub sueldotrabajado: Option<f64>,
    #[serde(default)]
    pub diaslaborados: Option<f64>,
    #[serde(default)]
    pub aux_transporte: Option<f64>,
    #[serde(default)]
    pub fechadesde: Option<String>,
    #[serde(default)]
    pub fechahasta: Option<String>,
    #[serde(default)]
    pub tracking_id: Option<String>,
    #[serde(default)]
    pub nov_contractual: Option<String>,
    #[serde(default)]
    pub total_empleados: Option<u64>,
}

impl Comprobante {
    /// Employee code rendered as text; the backend sends it as number or string.
    pub fn codigo_empleado(&self) -> String {
        json_scalar_text(self.empleado.as_ref())
    }

    pub fn numero_comprobante(&self) -> String {
        json_scalar_text(self.numerocomprobantedian.as_ref())
    }
}

fn json_scalar_text(value: Option<&serde_json::Value>) -> String {
    match value {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn employee_code_accepts_numbers_and_strings() {
        let numeric: Comprobante =
            serde_json::from_value(json!({"secuencia": 1, "empleado": 1020})).unwrap();
        let text: Comprobante =
            serde_json::from_value(json!({"secuencia": 2, "empleado": "E-77"})).unwrap();
        let missing: Comprobante = serde_json::from_value(json!({"secuencia": 3})).unwrap();

        assert_eq!(numeric.codigo_empleado(), "1020");
        assert_eq!(text.codigo_empleado(), "E-77");
        assert_eq!(missing.codigo_empleado(), "");
    }
}
