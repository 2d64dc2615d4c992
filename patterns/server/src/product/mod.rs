use crate::entities::sea_orm_active_enums::ProductCategory;
use crate::entities::*;
use rust_decimal::Decimal;
use sea_orm::*;

pub mod web;

/// Products shown per infinite-scroll page.
pub const PER_PAGE: u64 = 10;

#[derive(Debug, PartialEq, Clone)]
pub struct Product {
    id: i32,
    name: String,
    description: String,
    price: Decimal,
    category: ProductCategory,
    in_stock: bool,
}

impl Product {
    /// Returns the ID of the product.
    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    /// Price with exactly two decimals, e.g. `"29.99"`.
    pub fn price_display(&self) -> String {
        format!("{:.2}", self.price.round_dp(2))
    }

    pub fn category(&self) -> ProductCategory {
        self.category
    }

    /// Returns the display label of the category.
    pub fn category_label(&self) -> &'static str {
        self.category.label()
    }

    pub fn in_stock(&self) -> bool {
        self.in_stock
    }
}

impl From<product::Model> for Product {
    fn from(model: product::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            price: model.price,
            category: model.category,
            in_stock: model.in_stock,
        }
    }
}

/// Resolves a requested page number the way a classic paginator does.
///
/// A missing or non-numeric page is page 1. A page below 1 or past the end
/// falls back to the last page. An empty collection still has one page.
///
/// # Returns
///
/// `(page, total_pages)`, both 1-based.
pub fn resolve_page(requested: Option<&str>, total_items: u64, per_page: u64) -> (u64, u64) {
    let total_pages = total_items.div_ceil(per_page).max(1);
    let page = match requested.map(str::trim).map(str::parse::<i64>) {
        None | Some(Err(_)) => 1,
        Some(Ok(page)) if page < 1 || page as u64 > total_pages => total_pages,
        Some(Ok(page)) => page as u64,
    };
    (page, total_pages)
}

/// One page of products, newest first.
#[derive(Debug, PartialEq, Clone)]
pub struct ProductPage {
    products: Vec<Product>,
    page: u64,
    total_pages: u64,
}

impl ProductPage {
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Returns the 1-based page number.
    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn total_pages(&self) -> u64 {
        self.total_pages
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn next_page(&self) -> Option<u64> {
        self.has_next().then_some(self.page + 1)
    }
}

/// Error type for ProductService operations.
#[derive(Debug, thiserror::Error)]
pub enum ProductServiceError {
    /// Represents a product not found error.
    #[error("Product with ID {0} not found")]
    ProductNotFound(i32),
    /// Represents a database error.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

pub struct ProductService<'a> {
    db: &'a sea_orm::DatabaseConnection,
}

impl ProductService<'_> {
    pub fn new(db: &sea_orm::DatabaseConnection) -> ProductService<'_> {
        ProductService { db }
    }

    /// Retrieves one page of products for infinite scrolling.
    ///
    /// # Arguments
    ///
    /// * `requested_page` - The raw `page` parameter, if any.
    #[tracing::instrument(skip(self))]
    pub async fn list_products(
        &self,
        requested_page: Option<&str>,
    ) -> Result<ProductPage, ProductServiceError> {
        let paginator = product::Entity::find()
            .order_by_desc(product::Column::CreatedAt)
            .order_by_desc(product::Column::Id)
            .paginate(self.db, PER_PAGE);
        let total_items = paginator.num_items().await?;
        let (page, total_pages) = resolve_page(requested_page, total_items, PER_PAGE);

        let products = paginator
            .fetch_page(page - 1)
            .await?
            .into_iter()
            .map(Product::from)
            .collect();
        Ok(ProductPage {
            products,
            page,
            total_pages,
        })
    }

    /// Retrieves a product by its ID.
    #[tracing::instrument(skip(self))]
    pub async fn get_product(&self, id: i32) -> Result<Product, ProductServiceError> {
        let model = product::Entity::find_by_id(id)
            .one(self.db)
            .await?
            .ok_or(ProductServiceError::ProductNotFound(id))?;
        Ok(Product::from(model))
    }
}
