// Manual log entries - technician observations appended to the sheet
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::row::{Row, text_field};

pub const SEVERITIES: &[&str] = &["Baixa", "Média", "Alta", "Crítica"];
pub const ENTRY_KINDS: &[&str] = &[
    "Inspeção Visual",
    "Ruído Anormal",
    "Vazamento",
    "Termografia",
    "Manutenção Corretiva",
    "Outros",
];
pub const DEFAULT_SEVERITY: &str = "Média";
pub const DEFAULT_KIND: &str = "Inspeção Visual";

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Required field missing: {0}")]
    MissingField(&'static str),

    #[error("Invalid value for field {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManualEntry {
    pub ativoparque: String,
    pub data: String,
    pub gravidade: String,
    pub tipo: String,
    pub observacaotecnica: String,
}

impl ManualEntry {
    pub fn from_row(row: &Row) -> Self {
        Self {
            ativoparque: text_field(row, &["ativoparque", "ativoParque"], ""),
            data: text_field(row, &["data"], ""),
            gravidade: text_field(row, &["gravidade"], ""),
            tipo: text_field(row, &["tipo"], ""),
            observacaotecnica: text_field(row, &["observacaotecnica", "observacaoTecnica"], ""),
        }
    }

    pub fn is_critical(&self) -> bool {
        self.gravidade == "Crítica"
    }
}

/// Submitted form, before validation
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntryForm {
    #[serde(default)]
    pub ativoparque: String,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub gravidade: Option<String>,
    #[serde(default)]
    pub tipo: Option<String>,
    #[serde(default)]
    pub observacaotecnica: String,
}

impl EntryForm {
    pub fn validate(self) -> Result<ManualEntry, ValidationError> {
        let ativoparque = self.ativoparque.trim().to_string();
        if ativoparque.is_empty() {
            return Err(ValidationError::MissingField("ativoparque"));
        }
        let observacaotecnica = self.observacaotecnica.trim().to_string();
        if observacaotecnica.is_empty() {
            return Err(ValidationError::MissingField("observacaotecnica"));
        }

        let data = match blank_to_none(self.data) {
            None => Utc::now().date_naive().format("%Y-%m-%d").to_string(),
            Some(date) => {
                NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(|_| {
                    ValidationError::InvalidValue { field: "data", value: date.clone() }
                })?;
                date
            }
        };

        let gravidade = one_of("gravidade", self.gravidade, SEVERITIES, DEFAULT_SEVERITY)?;
        let tipo = one_of("tipo", self.tipo, ENTRY_KINDS, DEFAULT_KIND)?;

        Ok(ManualEntry {
            ativoparque,
            data,
            gravidade,
            tipo,
            observacaotecnica,
        })
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn one_of(
    field: &'static str,
    value: Option<String>,
    allowed: &[&str],
    default: &str,
) -> Result<String, ValidationError> {
    match blank_to_none(value) {
        None => Ok(default.to_string()),
        Some(v) if allowed.contains(&v.as_str()) => Ok(v),
        Some(v) => Err(ValidationError::InvalidValue { field, value: v }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(ativo: &str, obs: &str) -> EntryForm {
        EntryForm {
            ativoparque: ativo.to_string(),
            observacaotecnica: obs.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_applied() {
        let entry = form("TR-01", "Ruído no comutador").validate().unwrap();
        assert_eq!(entry.gravidade, DEFAULT_SEVERITY);
        assert_eq!(entry.tipo, DEFAULT_KIND);
        assert_eq!(entry.data, Utc::now().date_naive().format("%Y-%m-%d").to_string());
    }

    #[test]
    fn test_required_fields() {
        assert_eq!(
            form("  ", "obs").validate(),
            Err(ValidationError::MissingField("ativoparque"))
        );
        assert_eq!(
            form("TR-01", "").validate(),
            Err(ValidationError::MissingField("observacaotecnica"))
        );
    }

    #[test]
    fn test_rejects_unknown_severity_and_bad_date() {
        let mut f = form("TR-01", "obs");
        f.gravidade = Some("Urgente".into());
        assert!(matches!(f.validate(), Err(ValidationError::InvalidValue { field: "gravidade", .. })));

        let mut f = form("TR-01", "obs");
        f.data = Some("31/12/2024".into());
        assert!(matches!(f.validate(), Err(ValidationError::InvalidValue { field: "data", .. })));
    }

    #[test]
    fn test_explicit_values_kept() {
        let mut f = form("TR-01", "Vazamento no radiador");
        f.data = Some("2024-11-02".into());
        f.gravidade = Some("Crítica".into());
        f.tipo = Some("Vazamento".into());
        let entry = f.validate().unwrap();
        assert_eq!(entry.data, "2024-11-02");
        assert!(entry.is_critical());
        assert_eq!(entry.tipo, "Vazamento");
    }
}
