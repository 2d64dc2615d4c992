use sea_orm::entity::prelude::*;
use sea_orm::sea_query::StringLen;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(50))")]
pub enum ProductCategory {
    #[sea_orm(string_value = "electronics")]
    Electronics,
    #[sea_orm(string_value = "clothing")]
    Clothing,
    #[sea_orm(string_value = "books")]
    Books,
    #[sea_orm(string_value = "home")]
    Home,
    #[sea_orm(string_value = "sports")]
    Sports,
}

impl ProductCategory {
    /// Human readable label shown to users.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Electronics => "Electronics",
            Self::Clothing => "Clothing",
            Self::Books => "Books",
            Self::Home => "Home & Garden",
            Self::Sports => "Sports",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(50))")]
pub enum LocationCategory {
    #[sea_orm(string_value = "restaurant")]
    Restaurant,
    #[sea_orm(string_value = "hotel")]
    Hotel,
    #[sea_orm(string_value = "museum")]
    Museum,
    #[sea_orm(string_value = "park")]
    Park,
    #[sea_orm(string_value = "shopping")]
    Shopping,
    #[sea_orm(string_value = "office")]
    Office,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(4))")]
pub enum PriceRange {
    #[sea_orm(string_value = "$")]
    Budget,
    #[sea_orm(string_value = "$$")]
    Moderate,
    #[sea_orm(string_value = "$$$")]
    Expensive,
    #[sea_orm(string_value = "$$$$")]
    VeryExpensive,
}

impl PriceRange {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Budget => "Budget",
            Self::Moderate => "Moderate",
            Self::Expensive => "Expensive",
            Self::VeryExpensive => "Very Expensive",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum ServiceStatus {
    #[sea_orm(string_value = "operational")]
    Operational,
    #[sea_orm(string_value = "degraded")]
    Degraded,
    #[sea_orm(string_value = "partial_outage")]
    PartialOutage,
    #[sea_orm(string_value = "major_outage")]
    MajorOutage,
}

impl ServiceStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Operational => "Operational",
            Self::Degraded => "Degraded Performance",
            Self::PartialOutage => "Partial Outage",
            Self::MajorOutage => "Major Outage",
        }
    }
}
