//! Descriptor validation: every reference resolves and the table contract is
//! internally consistent.

use crate::error::ConfigError;
use crate::model::EntityModel;
use crate::resource::descriptor::{QueryScope, ResourceDescriptor};
use crate::resource::form::Widget;
use std::collections::{HashMap, HashSet};

pub fn validate(entities: &[EntityModel], resources: &[ResourceDescriptor]) -> Result<(), ConfigError> {
    let mut by_table: HashMap<&str, &EntityModel> = HashMap::new();
    for e in entities {
        if by_table.insert(e.table_name.as_str(), e).is_some() {
            return Err(ConfigError::Duplicate {
                kind: "entity",
                name: e.table_name.clone(),
            });
        }
        if !e.has_attribute(&e.primary_key) {
            return Err(ConfigError::MissingReference {
                kind: "primary key",
                id: format!("{}.{}", e.table_name, e.primary_key),
            });
        }
        for f in &e.fillable {
            if !e.has_attribute(f) {
                return Err(ConfigError::MissingReference {
                    kind: "fillable attribute",
                    id: format!("{}.{}", e.table_name, f),
                });
            }
        }
        for rel in &e.relations {
            if !e.has_attribute(&rel.foreign_key) {
                return Err(ConfigError::MissingReference {
                    kind: "foreign key",
                    id: format!("{}.{}", e.table_name, rel.foreign_key),
                });
            }
        }
    }
    for e in entities {
        for rel in &e.relations {
            if !by_table.contains_key(rel.related_table.as_str()) {
                return Err(ConfigError::MissingReference {
                    kind: "related entity",
                    id: rel.related_table.clone(),
                });
            }
        }
    }

    let mut slugs = HashSet::new();
    for r in resources {
        if !slugs.insert(r.slug.as_str()) {
            return Err(ConfigError::DuplicatePathSegment(r.slug.clone()));
        }
        let entity = by_table
            .get(r.entity.as_str())
            .ok_or_else(|| ConfigError::MissingReference {
                kind: "entity",
                id: r.entity.clone(),
            })?;
        let attr = |name: &str, kind: &'static str| -> Result<(), ConfigError> {
            if entity.has_attribute(name) {
                Ok(())
            } else {
                Err(ConfigError::MissingReference {
                    kind,
                    id: format!("{}.{}", r.slug, name),
                })
            }
        };

        let mut field_names = HashSet::new();
        for f in &r.form.fields {
            attr(&f.name, "form field")?;
            if !field_names.insert(f.name.as_str()) {
                return Err(ConfigError::Duplicate {
                    kind: "form field",
                    name: format!("{}.{}", r.slug, f.name),
                });
            }
            if !entity.is_fillable(&f.name) {
                return Err(ConfigError::Validation(format!(
                    "{}: form field {} is not fillable",
                    r.slug, f.name
                )));
            }
            if f.widget == Widget::Select && f.options.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "{}: select field {} has no options",
                    r.slug, f.name
                )));
            }
        }

        let mut column_names = HashSet::new();
        for c in &r.table.columns {
            attr(&c.name, "table column")?;
            if !column_names.insert(c.name.as_str()) {
                return Err(ConfigError::Duplicate {
                    kind: "table column",
                    name: format!("{}.{}", r.slug, c.name),
                });
            }
        }
        for f in &r.table.filters {
            attr(&f.name, "filter")?;
        }
        if let Some(ref sort) = r.table.default_sort {
            attr(&sort.column, "default sort column")?;
        }
        let p = &r.table.pagination;
        if p.options.is_empty() || !p.options.contains(&p.default) {
            return Err(ConfigError::Validation(format!(
                "{}: default page size is not one of the page size options",
                r.slug
            )));
        }
        if r.query_scope == QueryScope::WithTrashed && !entity.soft_deletes {
            return Err(ConfigError::Validation(format!(
                "{}: with_trashed scope on entity without soft deletes",
                r.slug
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::entity::Attribute;
    use crate::resource::{FormField, FormSchema, Navigation, PageSize, Pages, TableColumn, TableSchema};
    use crate::schema::SqlType;

    fn entity() -> EntityModel {
        EntityModel::new("things")
            .attribute(Attribute::new("name", SqlType::String(255)))
            .fillable(&["name"])
            .timestamps()
    }

    fn resource(form: Vec<FormField>, columns: Vec<TableColumn>) -> ResourceDescriptor {
        ResourceDescriptor {
            slug: "things".into(),
            entity: "things".into(),
            navigation: Navigation {
                icon: String::new(),
                group: String::new(),
                label: "Things".into(),
                model_label: "Thing".into(),
                plural_model_label: "Things".into(),
            },
            form: FormSchema::new(form),
            table: TableSchema::new(columns),
            query_scope: QueryScope::Default,
            pages: Pages::default(),
        }
    }

    #[test]
    fn accepts_consistent_descriptor() {
        let r = resource(vec![FormField::text("name", "Name")], vec![TableColumn::text("name", "Name")]);
        assert!(validate(&[entity()], &[r]).is_ok());
    }

    #[test]
    fn rejects_unknown_column() {
        let r = resource(vec![], vec![TableColumn::text("nope", "Nope")]);
        assert!(matches!(
            validate(&[entity()], &[r]),
            Err(ConfigError::MissingReference { kind: "table column", .. })
        ));
    }

    #[test]
    fn rejects_non_fillable_form_field() {
        let r = resource(vec![FormField::text("created_at", "Created")], vec![]);
        assert!(matches!(validate(&[entity()], &[r]), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn rejects_default_page_size_outside_options() {
        let mut r = resource(vec![], vec![]);
        r.table = r.table.paginated(vec![PageSize::Count(10)], PageSize::Count(20));
        assert!(matches!(validate(&[entity()], &[r]), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn rejects_duplicate_slug() {
        let a = resource(vec![], vec![]);
        let b = resource(vec![], vec![]);
        assert!(matches!(
            validate(&[entity()], &[a, b]),
            Err(ConfigError::DuplicatePathSegment(_))
        ));
    }
}
