#[derive(sqlx::FromRow, Debug, Clone)]
pub struct Client {
    pub id: i32,
    pub name: String,
    pub contact_email: String,
    pub is_active: bool,
}
