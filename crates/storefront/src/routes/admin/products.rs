//! Products in the admin panel, filterable by category.

use sqlx::PgPool;

use geekshop_core::{CategoryId, Price, ProductId};

use super::resource::{
    AdminResource, Choice, FieldErrors, FieldKind, FieldSpec, FormMode, FormValues, ListFilter,
    SaveError, TableColumn, TableRow, yes_no,
};
use crate::db::{CategoryRepository, ProductRepository, RepositoryError};
use crate::models::catalog::ProductInput;

/// Admin resource for `shop.products`.
pub struct Products;

fn parse(values: &FormValues) -> Result<ProductInput, SaveError> {
    let mut errors = FieldErrors::default();

    let category_id = match values.get("category_id").parse::<i32>() {
        Ok(id) if id > 0 => Some(CategoryId::new(id)),
        _ => {
            errors.add("category_id", "Select a category.");
            None
        }
    };
    let name = errors.require(values, "name");
    errors.max_length("name", &name, ProductInput::MAX_NAME_LENGTH);
    let short_desc = values.get("short_desc").to_string();
    errors.max_length("short_desc", &short_desc, ProductInput::MAX_SHORT_DESC_LENGTH);

    let price = match values.get("price") {
        "" => {
            errors.add("price", "This field is required.");
            None
        }
        raw => raw
            .parse::<Price>()
            .map_err(|e| errors.add("price", e.to_string()))
            .ok(),
    };

    let quantity = match values.get("quantity") {
        "" => Some(0),
        raw => match raw.parse::<i32>() {
            Ok(q) if q >= 0 => Some(q),
            _ => {
                errors.add("quantity", "Enter a whole number of 0 or more.");
                None
            }
        },
    };

    let (Some(category_id), Some(price), Some(quantity)) = (category_id, price, quantity) else {
        return Err(SaveError::Invalid(errors));
    };

    errors.finish(|| ProductInput {
        category_id,
        name,
        short_desc,
        description: values.get("description").to_string(),
        price,
        quantity,
        is_active: values.checkbox("is_active"),
    })
}

impl AdminResource for Products {
    const SLUG: &'static str = "products";
    const TITLE: &'static str = "Products";
    const SINGULAR: &'static str = "product";
    const LIST_FILTER: Option<&'static str> = Some("category");

    fn columns() -> Vec<TableColumn> {
        vec![
            TableColumn::new("name", "Name"),
            TableColumn::new("category", "Category"),
            TableColumn::numeric("price", "Price"),
            TableColumn::numeric("quantity", "In stock"),
            TableColumn::new("is_active", "Active"),
        ]
    }

    fn fields(_mode: FormMode) -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("category_id", "Category", FieldKind::Select).required(),
            FieldSpec::new("name", "Name", FieldKind::Text).required(),
            FieldSpec::new("short_desc", "Short description", FieldKind::Text),
            FieldSpec::new("description", "Description", FieldKind::TextArea),
            FieldSpec::new("price", "Price", FieldKind::Number).required(),
            FieldSpec::new("quantity", "In stock", FieldKind::Number),
            FieldSpec::new("is_active", "Active", FieldKind::Checkbox).checked(),
        ]
    }

    fn display_name(values: &FormValues) -> String {
        values.get("name").to_string()
    }

    async fn list(pool: &PgPool, filter: &ListFilter) -> Result<Vec<TableRow>, RepositoryError> {
        let products = ProductRepository::new(pool)
            .list_for_admin(filter.category)
            .await?;

        Ok(products
            .into_iter()
            .map(|p| TableRow {
                id: p.id.as_i32(),
                cells: vec![
                    p.name,
                    p.category_name,
                    p.price.to_string(),
                    p.quantity.to_string(),
                    yes_no(p.is_active),
                ],
                is_active: p.is_active,
            })
            .collect())
    }

    async fn load(pool: &PgPool, id: i32) -> Result<Option<FormValues>, RepositoryError> {
        let product = ProductRepository::new(pool).get(ProductId::new(id)).await?;

        Ok(product.map(|p| {
            FormValues::from_pairs([
                ("category_id", p.category_id.to_string()),
                ("name", p.name),
                ("short_desc", p.short_desc),
                ("description", p.description),
                ("price", p.price.to_string()),
                ("quantity", p.quantity.to_string()),
                ("is_active", FormValues::flag(p.is_active).to_string()),
            ])
        }))
    }

    /// Every category, inactive ones marked.
    async fn choices(pool: &PgPool) -> Result<Vec<Choice>, RepositoryError> {
        let categories = CategoryRepository::new(pool).list_all().await?;

        Ok(categories
            .into_iter()
            .map(|c| Choice {
                value: c.id.to_string(),
                label: if c.is_active {
                    c.name
                } else {
                    format!("{} (inactive)", c.name)
                },
            })
            .collect())
    }

    async fn create(pool: &PgPool, values: &FormValues) -> Result<i32, SaveError> {
        let input = parse(values)?;
        let id = ProductRepository::new(pool)
            .create(&input)
            .await
            .map_err(|e| SaveError::conflict_on(e, "category_id"))?;

        Ok(id.as_i32())
    }

    async fn update(pool: &PgPool, id: i32, values: &FormValues) -> Result<(), SaveError> {
        let input = parse(values)?;
        ProductRepository::new(pool)
            .update(ProductId::new(id), &input)
            .await
            .map_err(|e| SaveError::conflict_on(e, "category_id"))
    }

    async fn deactivate(pool: &PgPool, id: i32) -> Result<bool, RepositoryError> {
        ProductRepository::new(pool)
            .deactivate(ProductId::new(id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invalid(values: &FormValues) -> FieldErrors {
        match parse(values) {
            Err(SaveError::Invalid(errors)) => errors,
            other => panic!("expected validation errors, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_product() {
        let input = parse(&FormValues::from_pairs([
            ("category_id", "2"),
            ("name", "Game Boy"),
            ("price", "89.9"),
            ("quantity", "12"),
            ("is_active", "on"),
        ]))
        .unwrap_or_else(|e| panic!("unexpected error: {e:?}"));

        assert_eq!(input.category_id, CategoryId::new(2));
        assert_eq!(input.price.to_string(), "89.90");
        assert_eq!(input.quantity, 12);
        assert!(input.is_active);
    }

    #[test]
    fn test_blank_quantity_is_zero() {
        let input = parse(&FormValues::from_pairs([
            ("category_id", "1"),
            ("name", "Cartridge"),
            ("price", "5"),
        ]))
        .unwrap_or_else(|e| panic!("unexpected error: {e:?}"));
        assert_eq!(input.quantity, 0);
    }

    #[test]
    fn test_bad_values_reported_per_field() {
        let errors = invalid(&FormValues::from_pairs([
            ("category_id", "abc"),
            ("price", "-3"),
            ("quantity", "-1"),
        ]));

        assert_eq!(errors.get("category_id"), Some("Select a category."));
        assert_eq!(errors.get("name"), Some("This field is required."));
        assert!(errors.get("price").is_some());
        assert!(errors.get("quantity").is_some());
    }

    #[test]
    fn test_missing_price_required() {
        let errors = invalid(&FormValues::from_pairs([
            ("category_id", "1"),
            ("name", "Cartridge"),
        ]));
        assert_eq!(errors.get("price"), Some("This field is required."));
    }

    #[test]
    fn test_text_longer_than_column_rejected() {
        let name = "n".repeat(ProductInput::MAX_NAME_LENGTH + 1);
        let short_desc = "s".repeat(ProductInput::MAX_SHORT_DESC_LENGTH + 1);
        let errors = invalid(&FormValues::from_pairs([
            ("category_id", "1"),
            ("name", name.as_str()),
            ("short_desc", short_desc.as_str()),
            ("price", "5"),
        ]));

        assert_eq!(
            errors.get("name"),
            Some("Ensure this value has at most 128 characters.")
        );
        assert_eq!(
            errors.get("short_desc"),
            Some("Ensure this value has at most 64 characters.")
        );
    }
}
