//! Provider (supplier) Model

use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorCode};

/// Provider entity
///
/// Flat record; `name` is the only required field. Spanish aliases are
/// accepted on input so payloads written for the original forms
/// (`nombre`, `cuit`, `zona`, `rubro`, `marcas`, ...) still deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub id: String,
    #[serde(alias = "nombre")]
    pub name: String,
    #[serde(default, alias = "telefono")]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "direccion")]
    pub address: Option<String>,
    /// CUIT
    #[serde(default, alias = "cuit")]
    pub tax_id: Option<String>,
    #[serde(default, alias = "notas")]
    pub notes: Option<String>,
    #[serde(default, alias = "zona")]
    pub zone: Option<String>,
    /// Rubro
    #[serde(default, alias = "rubro")]
    pub category: Option<String>,
    /// Comma-separated free text
    #[serde(default, alias = "marcas")]
    pub brands: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Provider {
    /// Build a stored record from a creation payload
    pub fn from_create(id: String, data: ProviderCreate, now: i64) -> Self {
        Self {
            id,
            name: data.name,
            phone: data.phone,
            email: data.email,
            address: data.address,
            tax_id: data.tax_id,
            notes: data.notes,
            zone: data.zone,
            category: data.category,
            brands: data.brands,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update; absent fields keep their current value
    pub fn apply_update(&mut self, data: ProviderUpdate, now: i64) {
        if let Some(name) = data.name {
            self.name = name;
        }
        if data.phone.is_some() {
            self.phone = data.phone;
        }
        if data.email.is_some() {
            self.email = data.email;
        }
        if data.address.is_some() {
            self.address = data.address;
        }
        if data.tax_id.is_some() {
            self.tax_id = data.tax_id;
        }
        if data.notes.is_some() {
            self.notes = data.notes;
        }
        if data.zone.is_some() {
            self.zone = data.zone;
        }
        if data.category.is_some() {
            self.category = data.category;
        }
        if data.brands.is_some() {
            self.brands = data.brands;
        }
        self.updated_at = now;
    }

    /// Individual brands, trimmed, empty entries skipped
    pub fn brand_list(&self) -> Vec<&str> {
        self.brands
            .as_deref()
            .map(|b| {
                b.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Create provider payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderCreate {
    #[serde(default, alias = "nombre")]
    pub name: String,
    #[serde(default, alias = "telefono")]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "direccion")]
    pub address: Option<String>,
    #[serde(default, alias = "cuit")]
    pub tax_id: Option<String>,
    #[serde(default, alias = "notas")]
    pub notes: Option<String>,
    #[serde(default, alias = "zona")]
    pub zone: Option<String>,
    #[serde(default, alias = "rubro")]
    pub category: Option<String>,
    #[serde(default, alias = "marcas")]
    pub brands: Option<String>,
}

/// Update provider payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderUpdate {
    #[serde(default, alias = "nombre")]
    pub name: Option<String>,
    #[serde(default, alias = "telefono")]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "direccion")]
    pub address: Option<String>,
    #[serde(default, alias = "cuit")]
    pub tax_id: Option<String>,
    #[serde(default, alias = "notas")]
    pub notes: Option<String>,
    #[serde(default, alias = "zona")]
    pub zone: Option<String>,
    #[serde(default, alias = "rubro")]
    pub category: Option<String>,
    #[serde(default, alias = "marcas")]
    pub brands: Option<String>,
}

/// Required-field check for a new provider.
///
/// The name is the only required field: an empty name is rejected, any
/// other value is accepted as-is.
pub fn validate_provider(data: &ProviderCreate) -> Result<(), AppError> {
    if data.name.is_empty() {
        return Err(
            AppError::new(ErrorCode::ProviderNameRequired).with_detail("field", "name")
        );
    }
    Ok(())
}

/// Required-field check for a provider update: the name may be omitted
/// but not cleared.
pub fn validate_provider_update(data: &ProviderUpdate) -> Result<(), AppError> {
    match data.name.as_deref() {
        Some("") => Err(
            AppError::new(ErrorCode::ProviderNameRequired).with_detail("field", "name")
        ),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(name: &str) -> ProviderCreate {
        ProviderCreate {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let err = validate_provider(&create("")).unwrap_err();
        assert_eq!(err.code, ErrorCode::ProviderNameRequired);
        assert_eq!(err.details.unwrap().get("field").unwrap(), "name");
    }

    #[test]
    fn test_any_non_empty_name_is_accepted() {
        for name in ["Distribuidora Norte", "x", " ", "Ñandú S.A."] {
            assert!(validate_provider(&create(name)).is_ok(), "rejected {name:?}");
        }
    }

    #[test]
    fn test_update_cannot_clear_name() {
        let update = ProviderUpdate {
            name: Some(String::new()),
            ..Default::default()
        };
        assert!(validate_provider_update(&update).is_err());
        assert!(validate_provider_update(&ProviderUpdate::default()).is_ok());
    }

    #[test]
    fn test_spanish_aliases_deserialize() {
        let json = r#"{"nombre":"Ferretería Sur","cuit":"20-12345678-9","zona":"Oeste","rubro":"Ferretería","marcas":"Stanley, Bosch"}"#;
        let data: ProviderCreate = serde_json::from_str(json).unwrap();
        assert_eq!(data.name, "Ferretería Sur");
        assert_eq!(data.tax_id.as_deref(), Some("20-12345678-9"));
        assert_eq!(data.zone.as_deref(), Some("Oeste"));
        assert_eq!(data.category.as_deref(), Some("Ferretería"));
        assert_eq!(data.brands.as_deref(), Some("Stanley, Bosch"));
    }

    #[test]
    fn test_apply_update_keeps_absent_fields() {
        let mut provider = Provider::from_create(
            "p1".into(),
            ProviderCreate {
                name: "Old".into(),
                phone: Some("111".into()),
                zone: Some("Norte".into()),
                ..Default::default()
            },
            1,
        );

        provider.apply_update(
            ProviderUpdate {
                name: Some("New".into()),
                zone: Some("Sur".into()),
                ..Default::default()
            },
            2,
        );

        assert_eq!(provider.name, "New");
        assert_eq!(provider.phone.as_deref(), Some("111"));
        assert_eq!(provider.zone.as_deref(), Some("Sur"));
        assert_eq!(provider.created_at, 1);
        assert_eq!(provider.updated_at, 2);
    }

    #[test]
    fn test_brand_list() {
        let mut provider = Provider::from_create("p1".into(), create("A"), 0);
        assert!(provider.brand_list().is_empty());

        provider.brands = Some(" Acme,, Bosch ,".into());
        assert_eq!(provider.brand_list(), vec!["Acme", "Bosch"]);
    }
}
