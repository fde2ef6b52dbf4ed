// Archivo: user_persistence.rs
// Propósito: usuarios y el borrado en cascada de todo lo que les pertenece.
use crate::connection::{write_transaction, DbConn, DieselRepository};
use crate::crop_persistence::{cascade_crops, finish_cascade};
use crate::errors::map_db_err;
use crate::journal_persistence::{purge_activities, purge_documents, purge_treatments};
use crate::schema::{crops, field_activities, field_documents, field_treatments, users};
use agro_domain::{DeleteSummary, DomainError, NewUserRecord, Role, User, UserChanges, UserCredentials,
                  UserRepository};
use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = users)]
struct UserRow {
  id: i32,
  name: String,
  email: String,
  password_hash: String,
  role: String,
  created_at: NaiveDateTime,
}

impl UserRow {
  fn into_credentials(self) -> Result<UserCredentials, DomainError> {
    let user = User { id: self.id,
                      name: self.name,
                      email: self.email,
                      role: self.role.parse()?,
                      created_at: self.created_at };
    Ok(UserCredentials { user, password_hash: self.password_hash })
  }

  fn into_user(self) -> Result<User, DomainError> {
    self.into_credentials().map(|c| c.user)
  }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
struct NewUserRow<'a> {
  name: &'a str,
  email: &'a str,
  password_hash: &'a str,
  role: &'a str,
  created_at: NaiveDateTime,
}

/// Sólo se escriben las columnas presentes.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = users)]
struct UserChangeset<'a> {
  name: Option<&'a str>,
  email: Option<&'a str>,
  password_hash: Option<&'a str>,
  role: Option<&'a str>,
}

impl<'a> From<&'a UserChanges> for UserChangeset<'a> {
  fn from(c: &'a UserChanges) -> Self {
    UserChangeset { name: c.name.as_deref().map(str::trim),
                    email: c.email.as_deref(),
                    password_hash: c.password_hash.as_deref(),
                    role: c.role.map(|r| r.as_str()) }
  }
}

fn email_taken(conn: &mut DbConn, email: &str, except: Option<i32>) -> QueryResult<bool> {
  let mut query = users::table.filter(users::email.eq(email)).into_boxed();
  if let Some(id) = except {
    query = query.filter(users::id.ne(id));
  }
  Ok(query.select(users::id).first::<i32>(conn).optional()?.is_some())
}

fn load_user(conn: &mut DbConn, id: i32) -> Result<Option<User>, DomainError> {
  let row = map_db_err(users::table.find(id).select(UserRow::as_select()).first::<UserRow>(conn).optional())?;
  row.map(UserRow::into_user).transpose()
}

impl UserRepository for DieselRepository {
  fn list_users(&self, role: Option<Role>) -> Result<Vec<User>, DomainError> {
    let mut conn = self.conn()?;
    let mut query = users::table.into_boxed();
    if let Some(role) = role {
      query = query.filter(users::role.eq(role.as_str()));
    }
    let rows = map_db_err(query.order(users::id.asc()).select(UserRow::as_select()).load::<UserRow>(&mut conn))?;
    rows.into_iter().map(UserRow::into_user).collect()
  }

  fn get_user(&self, id: i32) -> Result<Option<User>, DomainError> {
    let mut conn = self.conn()?;
    load_user(&mut conn, id)
  }

  fn find_credentials_by_email(&self, email: &str) -> Result<Option<UserCredentials>, DomainError> {
    let mut conn = self.conn()?;
    let row = map_db_err(users::table.filter(users::email.eq(email))
                                     .select(UserRow::as_select())
                                     .first::<UserRow>(&mut conn)
                                     .optional())?;
    row.map(UserRow::into_credentials).transpose()
  }

  fn create_user(&self, user: &NewUserRecord) -> Result<User, DomainError> {
    let mut conn = self.conn()?;
    let conn: &mut DbConn = &mut conn;
    let row = write_transaction(conn, |conn| {
                if email_taken(conn, &user.email, None)? {
                  return Err(DomainError::ValidationError(format!("El email {} ya está registrado",
                                                                  user.email)).into());
                }
                let new = NewUserRow { name: user.name.trim(),
                                       email: &user.email,
                                       password_hash: &user.password_hash,
                                       role: user.role.as_str(),
                                       created_at: Utc::now().naive_utc() };
                Ok(diesel::insert_into(users::table).values(&new)
                                                    .returning(UserRow::as_returning())
                                                    .get_result::<UserRow>(conn)?)
              })?;
    row.into_user()
  }

  fn update_user(&self, id: i32, changes: &UserChanges) -> Result<Option<User>, DomainError> {
    let mut conn = self.conn()?;
    let conn: &mut DbConn = &mut conn;
    let nothing_to_change =
      changes.name.is_none() && changes.email.is_none() && changes.password_hash.is_none() && changes.role.is_none();
    if nothing_to_change {
      return load_user(conn, id);
    }
    let row = write_transaction(conn, |conn| {
                if let Some(email) = changes.email.as_deref() {
                  if email_taken(conn, email, Some(id))? {
                    return Err(DomainError::ValidationError(format!("El email {} ya está registrado",
                                                                    email)).into());
                  }
                }
                Ok(diesel::update(users::table.find(id)).set(UserChangeset::from(changes))
                                                        .returning(UserRow::as_returning())
                                                        .get_result::<UserRow>(conn)
                                                        .optional()?)
              })?;
    row.map(UserRow::into_user).transpose()
  }

  fn delete_user_cascade(&self, user_id: i32) -> Result<DeleteSummary, DomainError> {
    let mut conn = self.conn()?;
    let conn: &mut DbConn = &mut conn;
    let result = write_transaction(conn, |conn| {
                   let exists = users::table.find(user_id).select(users::id).first::<i32>(conn).optional()?;
                   if exists.is_none() {
                     return Err(DomainError::not_found("Usuario", user_id).into());
                   }

                   let crop_ids = crops::table.filter(crops::user_id.eq(user_id))
                                              .select(crops::id)
                                              .load::<i32>(conn)?;
                   let mut summary = cascade_crops(conn, &crop_ids)?;

                   let doc_ids = field_documents::table.filter(field_documents::user_id.eq(user_id))
                                                       .select(field_documents::id)
                                                       .load::<i32>(conn)?;
                   let (documents, files) = purge_documents(conn, &doc_ids)?;
                   summary.documents = documents;
                   summary.released_files = files;

                   let treatment_ids = field_treatments::table.filter(field_treatments::user_id.eq(user_id))
                                                              .select(field_treatments::id)
                                                              .load::<i32>(conn)?;
                   summary.treatments = purge_treatments(conn, &treatment_ids)?;

                   let activity_ids = field_activities::table.filter(field_activities::user_id.eq(user_id))
                                                             .select(field_activities::id)
                                                             .load::<i32>(conn)?;
                   summary.activities = purge_activities(conn, &activity_ids)?;

                   let left_crops = crops::table.filter(crops::user_id.eq(user_id))
                                                .count()
                                                .get_result::<i64>(conn)?;
                   let left_journal = field_activities::table.filter(field_activities::user_id.eq(user_id))
                                                             .count()
                                                             .get_result::<i64>(conn)?
                                      + field_treatments::table.filter(field_treatments::user_id.eq(user_id))
                                                               .count()
                                                               .get_result::<i64>(conn)?
                                      + field_documents::table.filter(field_documents::user_id.eq(user_id))
                                                              .count()
                                                              .get_result::<i64>(conn)?;
                   if left_crops + left_journal > 0 {
                     return Err(DomainError::IntegrityError(format!("el usuario {} conserva {} cultivos y {} \
                                                                     entradas del cuaderno",
                                                                    user_id, left_crops, left_journal)).into());
                   }

                   summary.users = diesel::delete(users::table.find(user_id)).execute(conn)?;
                   Ok(summary)
                 });
    finish_cascade("usuario", user_id, result)
  }
}
