use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "discounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub retailer_id: i64,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    #[sea_orm(unique)]
    pub discount_code: String,
    pub discount_value: f64,
    pub is_active: bool,
    pub expiration_date: DateTimeUtc,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::retailer::Entity",
        from = "Column::RetailerId",
        to = "super::retailer::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Retailer,
}

impl Related<super::retailer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Retailer.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
