use sea_orm::entity::prelude::*;

/// Push settings of one device.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "notification_preferences")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub device_id: i32,
    #[sea_orm(default_value = "true")]
    pub push_enabled: bool,
    /// Serialized delivery endpoint. Opaque to everything but the push gateway.
    #[sea_orm(column_type = "Text")]
    pub subscription: String,
    /// Lead time in days. `0` notifies on the due date itself.
    pub days_before_notify: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::device::Entity",
        from = "Column::DeviceId",
        to = "super::device::Column::Id",
        on_delete = "Cascade"
    )]
    Device,
}

impl Related<super::device::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Device.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
