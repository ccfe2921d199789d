use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建 retailers 表
        manager
            .create_table(
                Table::create()
                    .table(Retailer::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Retailer::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Retailer::Name)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Retailer::ContactInfo).text().null())
                    .col(ColumnDef::new(Retailer::Latitude).double().not_null())
                    .col(ColumnDef::new(Retailer::Longitude).double().not_null())
                    .col(
                        ColumnDef::new(Retailer::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Retailer::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建 discounts 表
        manager
            .create_table(
                Table::create()
                    .table(Discount::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Discount::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Discount::RetailerId).big_integer().not_null())
                    .col(ColumnDef::new(Discount::Description).text().not_null())
                    .col(
                        ColumnDef::new(Discount::DiscountCode)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Discount::DiscountValue)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Discount::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Discount::ExpirationDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Discount::Latitude).double().not_null())
                    .col(ColumnDef::new(Discount::Longitude).double().not_null())
                    .col(
                        ColumnDef::new(Discount::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Discount::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_discounts_retailer_id")
                            .from(Discount::Table, Discount::RetailerId)
                            .to(Retailer::Table, Retailer::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 经纬度包围盒查询走这两个复合索引
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_retailers_lat_lon")
                    .table(Retailer::Table)
                    .col(Retailer::Latitude)
                    .col(Retailer::Longitude)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_discounts_lat_lon")
                    .table(Discount::Table)
                    .col(Discount::Latitude)
                    .col(Discount::Longitude)
                    .to_owned(),
            )
            .await?;

        // 过期时间索引，便于按有效期过滤
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_discounts_expiration_date")
                    .table(Discount::Table)
                    .col(Discount::ExpirationDate)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 删除索引
        manager
            .drop_index(Index::drop().name("idx_discounts_expiration_date").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_discounts_lat_lon").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_retailers_lat_lon").to_owned())
            .await?;

        // 删除表（先删从表）
        manager
            .drop_table(Table::drop().table(Discount::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Retailer::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Retailer {
    #[sea_orm(iden = "retailers")]
    Table,
    Id,
    Name,
    ContactInfo,
    Latitude,
    Longitude,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Discount {
    #[sea_orm(iden = "discounts")]
    Table,
    Id,
    RetailerId,
    Description,
    DiscountCode,
    DiscountValue,
    IsActive,
    ExpirationDate,
    Latitude,
    Longitude,
    CreatedAt,
    UpdatedAt,
}
