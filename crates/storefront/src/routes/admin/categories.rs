//! Product categories in the admin panel.

use sqlx::PgPool;

use geekshop_core::CategoryId;

use super::resource::{
    AdminResource, FieldErrors, FieldKind, FieldSpec, FormMode, FormValues, ListFilter,
    SaveError, TableColumn, TableRow, yes_no,
};
use crate::db::{CategoryRepository, RepositoryError};
use crate::models::catalog::CategoryInput;

/// Admin resource for `shop.categories`.
pub struct Categories;

fn parse(values: &FormValues) -> Result<CategoryInput, SaveError> {
    let mut errors = FieldErrors::default();
    let name = errors.require(values, "name");
    errors.max_length("name", &name, CategoryInput::MAX_NAME_LENGTH);

    errors.finish(|| CategoryInput {
        name,
        description: values.get("description").to_string(),
        is_active: values.checkbox("is_active"),
    })
}

impl AdminResource for Categories {
    const SLUG: &'static str = "categories";
    const TITLE: &'static str = "Categories";
    const SINGULAR: &'static str = "category";

    fn columns() -> Vec<TableColumn> {
        vec![
            TableColumn::new("name", "Name"),
            TableColumn::new("description", "Description"),
            TableColumn::new("is_active", "Active"),
        ]
    }

    fn fields(_mode: FormMode) -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("name", "Name", FieldKind::Text).required(),
            FieldSpec::new("description", "Description", FieldKind::TextArea),
            FieldSpec::new("is_active", "Active", FieldKind::Checkbox).checked(),
        ]
    }

    fn display_name(values: &FormValues) -> String {
        values.get("name").to_string()
    }

    async fn list(pool: &PgPool, _filter: &ListFilter) -> Result<Vec<TableRow>, RepositoryError> {
        let categories = CategoryRepository::new(pool).list_all().await?;

        Ok(categories
            .into_iter()
            .map(|c| TableRow {
                id: c.id.as_i32(),
                cells: vec![c.name, c.description, yes_no(c.is_active)],
                is_active: c.is_active,
            })
            .collect())
    }

    async fn load(pool: &PgPool, id: i32) -> Result<Option<FormValues>, RepositoryError> {
        let category = CategoryRepository::new(pool).get(CategoryId::new(id)).await?;

        Ok(category.map(|c| {
            FormValues::from_pairs([
                ("name", c.name),
                ("description", c.description),
                ("is_active", FormValues::flag(c.is_active).to_string()),
            ])
        }))
    }

    async fn create(pool: &PgPool, values: &FormValues) -> Result<i32, SaveError> {
        let input = parse(values)?;
        let category = CategoryRepository::new(pool)
            .create(&input)
            .await
            .map_err(|e| SaveError::conflict_on(e, "name"))?;

        Ok(category.id.as_i32())
    }

    async fn update(pool: &PgPool, id: i32, values: &FormValues) -> Result<(), SaveError> {
        let input = parse(values)?;
        CategoryRepository::new(pool)
            .update(CategoryId::new(id), &input)
            .await
            .map_err(|e| SaveError::conflict_on(e, "name"))
    }

    async fn deactivate(pool: &PgPool, id: i32) -> Result<bool, RepositoryError> {
        CategoryRepository::new(pool)
            .deactivate(CategoryId::new(id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_required() {
        let result = parse(&FormValues::from_pairs([("description", "Retro stuff")]));
        assert!(matches!(
            result,
            Err(SaveError::Invalid(ref errors)) if errors.get("name").is_some()
        ));
    }

    #[test]
    fn test_name_longer_than_column_rejected() {
        let name = "x".repeat(CategoryInput::MAX_NAME_LENGTH + 1);
        let result = parse(&FormValues::from_pairs([("name", name.as_str())]));
        assert!(matches!(
            result,
            Err(SaveError::Invalid(ref errors)) if errors.get("name").is_some()
        ));

        let name = "x".repeat(CategoryInput::MAX_NAME_LENGTH);
        assert!(parse(&FormValues::from_pairs([("name", name.as_str())])).is_ok());
    }

    #[test]
    fn test_unticked_means_inactive() {
        let input = parse(&FormValues::from_pairs([("name", " Retro ")]))
            .unwrap_or_else(|e| panic!("unexpected error: {e:?}"));
        assert_eq!(input.name, "Retro");
        assert!(!input.is_active);
        assert_eq!(input.description, "");
    }
}
