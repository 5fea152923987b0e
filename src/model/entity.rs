//! Entity model: table binding, attribute casts, mass assignment and relations.

use crate::error::FieldErrors;
use crate::schema::SqlType;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;

/// Reinterpretation of a stored value at the storage/application boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cast {
    /// Stored as a flag (SMALLINT or BOOLEAN), surfaced as bool.
    Boolean,
    /// Stored as NUMERIC, surfaced as a decimal string with fixed scale.
    Decimal(u32),
    Integer,
}

#[derive(Clone, Debug)]
pub struct Attribute {
    pub name: String,
    pub sql_type: SqlType,
    pub cast: Option<Cast>,
    pub nullable: bool,
    /// Whether the column has a DB default (sequence, NOW()).
    pub has_default: bool,
}

impl Attribute {
    pub fn new(name: &str, sql_type: SqlType) -> Self {
        Self {
            name: name.to_string(),
            sql_type,
            cast: None,
            nullable: false,
            has_default: false,
        }
    }

    pub fn cast(mut self, cast: Cast) -> Self {
        self.cast = Some(cast);
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn with_default(mut self) -> Self {
        self.has_default = true;
        self
    }
}

/// Owning side of a many-to-one relation (our foreign key -> their key).
#[derive(Clone, Debug)]
pub struct BelongsTo {
    pub name: String,
    pub foreign_key: String,
    pub related_table: String,
    pub owner_key: String,
}

#[derive(Clone, Debug)]
pub struct EntityModel {
    pub schema_name: String,
    pub table_name: String,
    pub primary_key: String,
    pub attributes: Vec<Attribute>,
    /// Attributes that may be written from request input.
    pub fillable: Vec<String>,
    /// created_at / updated_at maintained by the database.
    pub timestamps: bool,
    /// Rows are flagged with deleted_at instead of being removed.
    pub soft_deletes: bool,
    pub relations: Vec<BelongsTo>,
}

pub const SOFT_DELETE_COLUMN: &str = "deleted_at";

impl EntityModel {
    /// New model with a BIGSERIAL `id` primary key in the `public` schema.
    pub fn new(table_name: &str) -> Self {
        Self {
            schema_name: "public".into(),
            table_name: table_name.to_string(),
            primary_key: "id".into(),
            attributes: vec![Attribute::new("id", SqlType::BigSerial).with_default()],
            fillable: Vec::new(),
            timestamps: false,
            soft_deletes: false,
            relations: Vec::new(),
        }
    }

    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn fillable(mut self, names: &[&str]) -> Self {
        self.fillable = names.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn timestamps(mut self) -> Self {
        self.timestamps = true;
        for name in ["created_at", "updated_at"] {
            self.attributes
                .push(Attribute::new(name, SqlType::TimestampTz).with_default());
        }
        self
    }

    pub fn soft_deletes(mut self) -> Self {
        self.soft_deletes = true;
        self.attributes
            .push(Attribute::new(SOFT_DELETE_COLUMN, SqlType::TimestampTz).nullable());
        self
    }

    pub fn belongs_to(mut self, name: &str, foreign_key: &str, related_table: &str) -> Self {
        self.relations.push(BelongsTo {
            name: name.to_string(),
            foreign_key: foreign_key.to_string(),
            related_table: related_table.to_string(),
            owner_key: "id".into(),
        });
        self
    }

    pub fn find_attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.find_attribute(name).is_some()
    }

    pub fn is_fillable(&self, name: &str) -> bool {
        self.fillable.iter().any(|f| f == name)
    }

    pub fn relation(&self, name: &str) -> Option<&BelongsTo> {
        self.relations.iter().find(|r| r.name == name)
    }

    /// Keep only fillable attributes from `input` and apply write casts.
    /// Non-fillable keys are dropped silently.
    pub fn fill(&self, input: &Map<String, Value>) -> Result<Map<String, Value>, FieldErrors> {
        let mut out = Map::new();
        let mut errors = FieldErrors::new();
        for (k, v) in input {
            if !self.is_fillable(k) {
                continue;
            }
            let Some(attr) = self.find_attribute(k) else { continue };
            match cast_for_write(attr, v) {
                Ok(v) => {
                    out.insert(k.clone(), v);
                }
                Err(msg) => errors.add(k, msg),
            }
        }
        errors.into_result().map(|_| out)
    }

    /// Convert a value destined for a WHERE clause or write into its storage form.
    pub fn storage_value(&self, name: &str, v: &Value) -> Value {
        match self.find_attribute(name) {
            Some(attr) => cast_for_write(attr, v).unwrap_or_else(|_| v.clone()),
            None => v.clone(),
        }
    }

    /// Apply read casts to a row object.
    pub fn cast_row(&self, mut row: Value) -> Value {
        if let Value::Object(ref mut map) = row {
            for attr in &self.attributes {
                let Some(cast) = attr.cast else { continue };
                if let Some(v) = map.get_mut(&attr.name) {
                    *v = cast_for_read(cast, v);
                }
            }
        }
        row
    }
}

fn cast_for_read(cast: Cast, v: &Value) -> Value {
    match (cast, v) {
        (_, Value::Null) => Value::Null,
        (Cast::Boolean, Value::Number(n)) => Value::Bool(n.as_i64().unwrap_or(0) != 0),
        (Cast::Boolean, Value::String(s)) => Value::Bool(!matches!(s.as_str(), "" | "0" | "false")),
        (Cast::Decimal(scale), Value::String(s)) => match Decimal::from_str(s) {
            Ok(d) => Value::String(fixed(d, scale)),
            Err(_) => v.clone(),
        },
        (Cast::Decimal(scale), Value::Number(n)) => match Decimal::from_str(&n.to_string()) {
            Ok(d) => Value::String(fixed(d, scale)),
            Err(_) => v.clone(),
        },
        (Cast::Integer, Value::String(s)) => s.parse::<i64>().map(Value::from).unwrap_or_else(|_| v.clone()),
        _ => v.clone(),
    }
}

fn fixed(mut d: Decimal, scale: u32) -> String {
    d.rescale(scale);
    d.to_string()
}

fn cast_for_write(attr: &Attribute, v: &Value) -> Result<Value, String> {
    if v.is_null() {
        return Ok(Value::Null);
    }
    let flag = match attr.cast {
        Some(Cast::Boolean) => Some(as_flag(v).ok_or_else(|| format!("{} must be true or false", attr.name))?),
        _ => None,
    };
    if let Some(b) = flag {
        return Ok(match attr.sql_type {
            SqlType::Boolean => Value::Bool(b),
            _ => Value::from(i64::from(b)),
        });
    }
    match attr.sql_type {
        SqlType::Decimal { scale, .. } => {
            let d = match v {
                Value::String(s) => Decimal::from_str(s.trim()).ok(),
                Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
                _ => None,
            }
            .ok_or_else(|| format!("{} must be a decimal number", attr.name))?;
            Ok(Value::String(fixed(d, u32::from(scale))))
        }
        SqlType::BigInt | SqlType::BigSerial | SqlType::Integer | SqlType::SmallInt => match v {
            Value::Number(n) if n.is_i64() => Ok(v.clone()),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| format!("{} must be an integer", attr.name)),
            _ => Err(format!("{} must be an integer", attr.name)),
        },
        SqlType::Boolean => as_flag(v)
            .map(Value::Bool)
            .ok_or_else(|| format!("{} must be true or false", attr.name)),
        _ => Ok(v.clone()),
    }
}

/// Accepts bool, 0/1 and their string forms.
pub(crate) fn as_flag(v: &Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim() {
            "1" | "true" => Some(true),
            "0" | "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
