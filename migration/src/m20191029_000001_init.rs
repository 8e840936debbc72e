use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ========== UPLINKS ==========
        // One row per relayed webhook envelope. The id is generated by the
        // collector and shared with the reading decoded from the payload.
        manager
            .create_table(
                Table::create()
                    .table(Uplinks::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Uplinks::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Uplinks::AppId).string_len(64).not_null())
                    .col(ColumnDef::new(Uplinks::DevId).string_len(64).not_null())
                    .col(ColumnDef::new(Uplinks::HwSerial).string_len(32).not_null())
                    .col(ColumnDef::new(Uplinks::Port).integer().not_null())
                    .col(ColumnDef::new(Uplinks::Counter).big_integer().not_null())
                    .col(ColumnDef::new(Uplinks::IsRetry).boolean().not_null())
                    .col(ColumnDef::new(Uplinks::IsConfirmed).boolean().not_null())
                    .col(ColumnDef::new(Uplinks::PayloadRaw).text().not_null())
                    .col(
                        ColumnDef::new(Uplinks::UplinkTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Uplinks::Frequency).float().not_null())
                    .col(ColumnDef::new(Uplinks::Modulation).string_len(16).not_null())
                    .col(ColumnDef::new(Uplinks::DataRate).string_len(32).not_null())
                    .col(ColumnDef::new(Uplinks::BitRate).big_integer())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uplinks_uplink_time_idx")
                    .table(Uplinks::Table)
                    .col(Uplinks::UplinkTime)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // ========== READINGS ==========
        manager
            .create_table(
                Table::create()
                    .table(Readings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Readings::UplinkId)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Readings::ReceivedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Readings::Device).string_len(64).not_null())
                    .col(
                        ColumnDef::new(Readings::RecordedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Readings::FrameVersion).small_integer().not_null())
                    .col(ColumnDef::new(Readings::Hardware).small_integer().not_null())
                    .col(ColumnDef::new(Readings::Uptime).big_integer().not_null())
                    .col(ColumnDef::new(Readings::Temperature).float().not_null())
                    .col(ColumnDef::new(Readings::TemperatureCal).float().not_null())
                    .col(ColumnDef::new(Readings::TemperatureIsCal).boolean().not_null())
                    .col(ColumnDef::new(Readings::Humidity).float().not_null())
                    .col(ColumnDef::new(Readings::Pressure).float().not_null())
                    .col(ColumnDef::new(Readings::Ccs811Status).small_integer().not_null())
                    .col(ColumnDef::new(Readings::Co2).integer().not_null())
                    .col(ColumnDef::new(Readings::Tvoc).integer().not_null())
                    .col(ColumnDef::new(Readings::Voltage).small_integer().not_null())
                    .col(ColumnDef::new(Readings::GpsFix).boolean().not_null())
                    .col(ColumnDef::new(Readings::Satellites).small_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_readings_uplink")
                            .from(Readings::Table, Readings::UplinkId)
                            .to(Uplinks::Table, Uplinks::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("readings_recorded_at_idx")
                    .table(Readings::Table)
                    .col(Readings::RecordedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("readings_device_idx")
                    .table(Readings::Table)
                    .col(Readings::Device)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Readings reference uplinks, drop them first
        manager
            .drop_table(Table::drop().table(Readings::Table).if_exists().to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Uplinks::Table).if_exists().to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
pub enum Uplinks {
    Table,
    Id,
    AppId,
    DevId,
    HwSerial,
    Port,
    Counter,
    IsRetry,
    IsConfirmed,
    PayloadRaw,
    UplinkTime,
    Frequency,
    Modulation,
    DataRate,
    BitRate,
}

#[derive(DeriveIden)]
pub enum Readings {
    Table,
    UplinkId,
    ReceivedAt,
    Device,
    RecordedAt,
    FrameVersion,
    Hardware,
    Uptime,
    Temperature,
    TemperatureCal,
    TemperatureIsCal,
    Humidity,
    Pressure,
    #[sea_orm(iden = "ccs811_status")]
    Ccs811Status,
    Co2,
    Tvoc,
    Voltage,
    GpsFix,
    Satellites,
}
