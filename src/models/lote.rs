//! Payroll batch ("lote") record and its enumerated codes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Lock flag gating whether a batch may still be edited or resubmitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Candado {
    #[serde(rename = "S")]
    S,
    #[serde(rename = "N")]
    N,
}

impl Candado {
    pub fn as_str(&self) -> &'static str {
        match self {
            Candado::S => "S",
            Candado::N => "N",
        }
    }
}

impl fmt::Display for Candado {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Candado {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "S" => Ok(Candado::S),
            "N" => Ok(Candado::N),
            other => Err(format!("candado must be S or N, got '{}'", other)),
        }
    }
}

/// Submission procedure of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Accion {
    #[default]
    NormalMes,
    AjusteModificacion,
    AjusteEliminacion,
    NovedadContractual,
    NormalTardia,
    NormalRechazado,
}

impl Accion {
    pub const ALL: [Accion; 6] = [
        Accion::NormalMes,
        Accion::AjusteModificacion,
        Accion::AjusteEliminacion,
        Accion::NovedadContractual,
        Accion::NormalTardia,
        Accion::NormalRechazado,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Accion::NormalMes => "NINM",
            Accion::AjusteModificacion => "NIAM",
            Accion::AjusteEliminacion => "NIAE",
            Accion::NovedadContractual => "NINC",
            Accion::NormalTardia => "NINT",
            Accion::NormalRechazado => "NINR",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Accion::NormalMes => "Normal Mes",
            Accion::AjusteModificacion => "Ajuste Modificación",
            Accion::AjusteEliminacion => "Ajuste Eliminación",
            Accion::NovedadContractual => "Novedad Contractual",
            Accion::NormalTardia => "Normal Tardía",
            Accion::NormalRechazado => "Normal Rechazado",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|accion| accion.code().eq_ignore_ascii_case(code.trim()))
    }
}

impl FromStr for Accion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Accion::from_code(s).ok_or_else(|| format!("unknown accion code '{}'", s))
    }
}

/// Month names as the backend spells them, indexed from January.
pub const MESES: [&str; 12] = [
    "ENERO",
    "FEBRERO",
    "MARZO",
    "ABRIL",
    "MAYO",
    "JUNIO",
    "JULIO",
    "AGOSTO",
    "SEPTIEMBRE",
    "OCTUBRE",
    "NOVIEMBRE",
    "DICIEMBRE",
];

/// A payroll-submission unit for one company, year and month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lote {
    pub secuencia: i64,
    #[serde(default)]
    pub empresa: i64,
    #[serde(default)]
    pub ano: i32,
    #[serde(default)]
    pub mes_nombre: String,
    #[serde(default)]
    pub lote: i64,
    #[serde(default)]
    pub consecutivo: i64,
    #[serde(default)]
    pub ajuste: String,
    #[serde(default)]
    pub fechaenvio: Option<String>,
    #[serde(default)]
    pub accion: String,
    #[serde(default)]
    pub sucursalpila: Option<String>,
    #[serde(default)]
    pub notas: Option<String>,
    #[serde(default)]
    pub respuesta_xml: Option<String>,
    #[serde(default)]
    pub tracking_id: Option<String>,
    pub candado: Candado,
    #[serde(default)]
    pub token: Option<String>,
}

impl Lote {
    /// Human label of the batch's action code; unknown codes pass through.
    pub fn accion_label(&self) -> &str {
        Accion::from_code(&self.accion)
            .map(|accion| accion.label())
            .unwrap_or(&self.accion)
    }
}

/// Earliest year accepted for a new batch.
pub const MIN_ANO: i32 = 1990;
/// Latest year accepted for a new batch.
pub const MAX_ANO: i32 = 2050;

/// Payload of the batch validation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NuevoLote {
    pub empresa: i64,
    pub ano: i32,
    pub mes: u32,
    pub accion: String,
    pub ajuste: String,
}

impl NuevoLote {
    /// Validate user input; new batches are never adjustments (`ajuste = "N"`).
    pub fn new(empresa: i64, ano: &str, mes: u32, accion: &str) -> Result<Self, ValidationError> {
        let ano_trimmed = ano.trim();
        if ano_trimmed.len() != 4 || !ano_trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::YearFormat {
                value: ano.to_string(),
            });
        }
        let ano_value: i32 = ano_trimmed
            .parse()
            .map_err(|_| ValidationError::YearFormat {
                value: ano.to_string(),
            })?;
        if !(MIN_ANO..=MAX_ANO).contains(&ano_value) {
            return Err(ValidationError::YearOutOfRange {
                value: ano_value,
                min: MIN_ANO,
                max: MAX_ANO,
            });
        }
        if !(1..=12).contains(&mes) {
            return Err(ValidationError::MonthOutOfRange { value: mes });
        }
        let accion = if accion.trim().is_empty() {
            Accion::default()
        } else {
            Accion::from_code(accion).ok_or_else(|| ValidationError::UnknownAccion {
                value: accion.to_string(),
            })?
        };

        Ok(Self {
            empresa,
            ano: ano_value,
            mes,
            accion: accion.code().to_string(),
            ajuste: "N".to_string(),
        })
    }
}
