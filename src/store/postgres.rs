use uuid::Uuid;
use validator::Validate;

use super::{
	ContactGateway, Error, Order, PostGateway, PostPredicate, Result, SessionGateway, UserGateway,
};
use crate::{
	model::{
		Contact, CreateContactInput, CreatePostInput, CreateUserInput, Post, UpdateContactInput,
		UpdatePostInput, UpdateUserInput, User,
	},
	Database,
};

/// Gateway implementation backed by a Postgres connection pool.
#[derive(Clone)]
pub struct PgStore {
	database: Database,
}

impl PgStore {
	pub fn new(database: Database) -> Self {
		Self { database }
	}
}

/// Maps database constraint violations onto [`Error::Constraint`].
fn constraint(error: sqlx::Error) -> Error {
	match error {
		sqlx::Error::Database(ref d) => match d.constraint() {
			Some("user_email_key") => Error::Constraint("email already taken"),
			_ if d.is_unique_violation() => Error::Constraint("value already taken"),
			_ if d.is_foreign_key_violation() => Error::Constraint("referenced row missing"),
			_ if d.is_check_violation() => Error::Constraint("value must not be empty"),
			_ => Error::Database(error),
		},
		e => Error::Database(e),
	}
}

fn order_by(order: Order) -> &'static str {
	match order {
		Order::Newest => "created_at DESC, id DESC",
		Order::IdAscending => "id ASC",
	}
}

#[axum::async_trait]
impl PostGateway for PgStore {
	#[tracing::instrument(skip(self, input), err)]
	async fn create(&self, author: &str, input: CreatePostInput) -> Result<Post> {
		input.validate()?;

		sqlx::query_as::<_, Post>(
			r#"
				INSERT INTO post (title, body, author)
				VALUES ($1, $2, $3)
				RETURNING *
			"#,
		)
		.bind(input.title)
		.bind(input.body)
		.bind(author)
		.fetch_one(&self.database)
		.await
		.map_err(constraint)
	}

	#[tracing::instrument(skip(self), err)]
	async fn get(&self, id: i64) -> Result<Post> {
		sqlx::query_as::<_, Post>("SELECT * FROM post WHERE id = $1")
			.bind(id)
			.fetch_optional(&self.database)
			.await?
			.ok_or(Error::NotFound { entity: "post", id })
	}

	#[tracing::instrument(skip(self, patch), err)]
	async fn update(&self, id: i64, patch: UpdatePostInput) -> Result<Post> {
		patch.validate()?;

		sqlx::query_as::<_, Post>(
			r#"
				UPDATE post
				SET title = COALESCE($1, title), body = COALESCE($2, body), updated_at = NOW()
				WHERE id = $3
				RETURNING *
			"#,
		)
		.bind(patch.title)
		.bind(patch.body)
		.bind(id)
		.fetch_optional(&self.database)
		.await
		.map_err(constraint)?
		.ok_or(Error::NotFound { entity: "post", id })
	}

	#[tracing::instrument(skip(self), err)]
	async fn delete(&self, id: i64) -> Result<()> {
		let status = sqlx::query("DELETE FROM post WHERE id = $1")
			.bind(id)
			.execute(&self.database)
			.await?;

		if status.rows_affected() == 0 {
			return Err(Error::NotFound { entity: "post", id });
		}

		Ok(())
	}

	#[tracing::instrument(skip(self), err)]
	async fn list(
		&self,
		predicate: PostPredicate,
		order: Order,
		offset: i64,
		limit: i64,
	) -> Result<Vec<Post>> {
		let query = format!(
			r#"
				SELECT * FROM post
				WHERE ($1::timestamptz IS NULL OR created_at >= $1)
				AND ($2::timestamptz IS NULL OR created_at < $2)
				ORDER BY {}
				LIMIT $3 OFFSET $4
			"#,
			order_by(order)
		);

		Ok(sqlx::query_as::<_, Post>(&query)
			.bind(predicate.created_from)
			.bind(predicate.created_before)
			.bind(limit)
			.bind(offset)
			.fetch_all(&self.database)
			.await?)
	}

	#[tracing::instrument(skip(self), err)]
	async fn count(&self, predicate: PostPredicate) -> Result<i64> {
		Ok(sqlx::query_scalar::<_, i64>(
			r#"
				SELECT COUNT(*) FROM post
				WHERE ($1::timestamptz IS NULL OR created_at >= $1)
				AND ($2::timestamptz IS NULL OR created_at < $2)
			"#,
		)
		.bind(predicate.created_from)
		.bind(predicate.created_before)
		.fetch_one(&self.database)
		.await?)
	}
}

#[axum::async_trait]
impl UserGateway for PgStore {
	#[tracing::instrument(skip(self, input, password_hash), fields(email = %input.email), err)]
	async fn create(&self, input: CreateUserInput, password_hash: String) -> Result<User> {
		input.validate()?;

		sqlx::query_as::<_, User>(
			r#"
				INSERT INTO "user" (name, email, permission, password, verified)
				VALUES ($1, $2, $3, $4, TRUE)
				RETURNING *
			"#,
		)
		.bind(input.name)
		.bind(input.email)
		.bind(input.permission)
		.bind(password_hash)
		.fetch_one(&self.database)
		.await
		.map_err(constraint)
	}

	#[tracing::instrument(skip(self), err)]
	async fn get(&self, id: i64) -> Result<User> {
		sqlx::query_as::<_, User>(r#"SELECT * FROM "user" WHERE id = $1"#)
			.bind(id)
			.fetch_optional(&self.database)
			.await?
			.ok_or(Error::NotFound { entity: "user", id })
	}

	#[tracing::instrument(skip(self), err)]
	async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
		Ok(
			sqlx::query_as::<_, User>(r#"SELECT * FROM "user" WHERE LOWER(email) = LOWER($1)"#)
				.bind(email)
				.fetch_optional(&self.database)
				.await?,
		)
	}

	#[tracing::instrument(skip(self, patch), err)]
	async fn update(&self, id: i64, patch: UpdateUserInput) -> Result<User> {
		patch.validate()?;

		sqlx::query_as::<_, User>(
			r#"
				UPDATE "user"
				SET name = COALESCE($1, name),
					email = COALESCE($2, email),
					permission = COALESCE($3, permission)
				WHERE id = $4
				RETURNING *
			"#,
		)
		.bind(patch.name)
		.bind(patch.email)
		.bind(patch.permission)
		.bind(id)
		.fetch_optional(&self.database)
		.await
		.map_err(constraint)?
		.ok_or(Error::NotFound { entity: "user", id })
	}

	#[tracing::instrument(skip(self), err)]
	async fn delete(&self, id: i64) -> Result<()> {
		let status = sqlx::query(r#"DELETE FROM "user" WHERE id = $1"#)
			.bind(id)
			.execute(&self.database)
			.await?;

		if status.rows_affected() == 0 {
			return Err(Error::NotFound { entity: "user", id });
		}

		Ok(())
	}

	#[tracing::instrument(skip(self), err)]
	async fn list(&self, order: Order, offset: i64, limit: i64) -> Result<Vec<User>> {
		let query = format!(
			r#"SELECT * FROM "user" ORDER BY {} LIMIT $1 OFFSET $2"#,
			order_by(order)
		);

		Ok(sqlx::query_as::<_, User>(&query)
			.bind(limit)
			.bind(offset)
			.fetch_all(&self.database)
			.await?)
	}

	#[tracing::instrument(skip(self), err)]
	async fn count(&self) -> Result<i64> {
		Ok(sqlx::query_scalar::<_, i64>(r#"SELECT COUNT(*) FROM "user""#)
			.fetch_one(&self.database)
			.await?)
	}
}

#[axum::async_trait]
impl ContactGateway for PgStore {
	#[tracing::instrument(skip(self, input), err)]
	async fn create(&self, input: CreateContactInput) -> Result<Contact> {
		input.validate()?;

		sqlx::query_as::<_, Contact>(
			r#"
				INSERT INTO contact (email, link, type, message)
				VALUES ($1, $2, $3, $4)
				RETURNING *
			"#,
		)
		.bind(input.email)
		.bind(input.link)
		.bind(input.kind)
		.bind(input.message)
		.fetch_one(&self.database)
		.await
		.map_err(constraint)
	}

	#[tracing::instrument(skip(self), err)]
	async fn get(&self, id: i64) -> Result<Contact> {
		sqlx::query_as::<_, Contact>("SELECT * FROM contact WHERE id = $1")
			.bind(id)
			.fetch_optional(&self.database)
			.await?
			.ok_or(Error::NotFound {
				entity: "contact",
				id,
			})
	}

	#[tracing::instrument(skip(self, patch), err)]
	async fn update(&self, id: i64, patch: UpdateContactInput) -> Result<Contact> {
		patch.validate()?;

		sqlx::query_as::<_, Contact>(
			r#"
				UPDATE contact
				SET email = COALESCE($1, email),
					link = COALESCE($2, link),
					type = COALESCE($3, type),
					message = COALESCE($4, message)
				WHERE id = $5
				RETURNING *
			"#,
		)
		.bind(patch.email)
		.bind(patch.link)
		.bind(patch.kind)
		.bind(patch.message)
		.bind(id)
		.fetch_optional(&self.database)
		.await
		.map_err(constraint)?
		.ok_or(Error::NotFound {
			entity: "contact",
			id,
		})
	}

	#[tracing::instrument(skip(self), err)]
	async fn delete(&self, id: i64) -> Result<()> {
		let status = sqlx::query("DELETE FROM contact WHERE id = $1")
			.bind(id)
			.execute(&self.database)
			.await?;

		if status.rows_affected() == 0 {
			return Err(Error::NotFound {
				entity: "contact",
				id,
			});
		}

		Ok(())
	}

	#[tracing::instrument(skip(self), err)]
	async fn list(&self, order: Order, offset: i64, limit: i64) -> Result<Vec<Contact>> {
		let query = format!(
			"SELECT * FROM contact ORDER BY {} LIMIT $1 OFFSET $2",
			order_by(order)
		);

		Ok(sqlx::query_as::<_, Contact>(&query)
			.bind(limit)
			.bind(offset)
			.fetch_all(&self.database)
			.await?)
	}

	#[tracing::instrument(skip(self), err)]
	async fn count(&self) -> Result<i64> {
		Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM contact")
			.fetch_one(&self.database)
			.await?)
	}
}

#[axum::async_trait]
impl SessionGateway for PgStore {
	#[tracing::instrument(skip(self), err)]
	async fn create(&self, user_id: i64) -> Result<Uuid> {
		sqlx::query_scalar::<_, Uuid>("INSERT INTO session (user_id) VALUES ($1) RETURNING id")
			.bind(user_id)
			.fetch_one(&self.database)
			.await
			.map_err(constraint)
	}

	#[tracing::instrument(skip(self), err)]
	async fn find_user(&self, session_id: Uuid) -> Result<Option<User>> {
		Ok(sqlx::query_as::<_, User>(
			r#"
				SELECT * FROM "user" WHERE id = (
					SELECT user_id FROM session WHERE id = $1
				)
			"#,
		)
		.bind(session_id)
		.fetch_optional(&self.database)
		.await?)
	}

	#[tracing::instrument(skip(self), err)]
	async fn delete(&self, session_id: Uuid) -> Result<()> {
		sqlx::query("DELETE FROM session WHERE id = $1")
			.bind(session_id)
			.execute(&self.database)
			.await?;

		Ok(())
	}
}
