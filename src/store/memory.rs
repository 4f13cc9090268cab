use std::{
	collections::HashMap,
	sync::{Mutex, MutexGuard},
};

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use super::{
	ContactGateway, Error, Order, PostGateway, PostPredicate, Result, SessionGateway, UserGateway,
};
use crate::model::{
	Contact, CreateContactInput, CreatePostInput, CreateUserInput, Post, UpdateContactInput,
	UpdatePostInput, UpdateUserInput, User,
};

#[derive(Default)]
struct Tables {
	next_id: i64,
	posts: Vec<Post>,
	users: Vec<User>,
	contacts: Vec<Contact>,
	sessions: HashMap<Uuid, i64>,
}

impl Tables {
	fn next_id(&mut self) -> i64 {
		self.next_id += 1;
		self.next_id
	}
}

/// In-memory gateways used by the router tests.
#[derive(Default)]
pub struct MemoryStore {
	tables: Mutex<Tables>,
}

impl MemoryStore {
	fn tables(&self) -> MutexGuard<'_, Tables> {
		self.tables.lock().unwrap()
	}

	pub fn posts(&self) -> Vec<Post> {
		self.tables().posts.clone()
	}

	pub fn users(&self) -> Vec<User> {
		self.tables().users.clone()
	}

	pub fn contacts(&self) -> Vec<Contact> {
		self.tables().contacts.clone()
	}

	pub fn session_count(&self) -> usize {
		self.tables().sessions.len()
	}

	/// Inserts a post with a fixed creation time.
	pub fn insert_post(&self, mut post: Post) -> Post {
		let mut tables = self.tables();

		post.id = tables.next_id();
		tables.posts.push(post.clone());
		post
	}
}

fn page<T>(items: Vec<T>, offset: i64, limit: i64) -> Vec<T> {
	let offset = usize::try_from(offset).unwrap_or(0);
	let limit = usize::try_from(limit).unwrap_or(0);

	items.into_iter().skip(offset).take(limit).collect()
}

#[axum::async_trait]
impl PostGateway for MemoryStore {
	async fn create(&self, author: &str, input: CreatePostInput) -> Result<Post> {
		input.validate()?;

		let mut tables = self.tables();
		let now = Utc::now();
		let post = Post {
			id: tables.next_id(),
			title: input.title,
			body: input.body,
			author: author.to_owned(),
			created_at: now,
			updated_at: now,
		};

		tables.posts.push(post.clone());
		Ok(post)
	}

	async fn get(&self, id: i64) -> Result<Post> {
		self.tables()
			.posts
			.iter()
			.find(|post| post.id == id)
			.cloned()
			.ok_or(Error::NotFound { entity: "post", id })
	}

	async fn update(&self, id: i64, patch: UpdatePostInput) -> Result<Post> {
		patch.validate()?;

		let mut tables = self.tables();
		let post = tables
			.posts
			.iter_mut()
			.find(|post| post.id == id)
			.ok_or(Error::NotFound { entity: "post", id })?;

		if let Some(title) = patch.title {
			post.title = title;
		}

		if let Some(body) = patch.body {
			post.body = body;
		}

		post.updated_at = Utc::now();
		Ok(post.clone())
	}

	async fn delete(&self, id: i64) -> Result<()> {
		let mut tables = self.tables();
		let before = tables.posts.len();

		tables.posts.retain(|post| post.id != id);

		if tables.posts.len() == before {
			return Err(Error::NotFound { entity: "post", id });
		}

		Ok(())
	}

	async fn list(
		&self,
		predicate: PostPredicate,
		order: Order,
		offset: i64,
		limit: i64,
	) -> Result<Vec<Post>> {
		let mut posts = self
			.tables()
			.posts
			.iter()
			.filter(|post| predicate.matches(post))
			.cloned()
			.collect::<Vec<_>>();

		match order {
			Order::Newest => posts.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id))),
			Order::IdAscending => posts.sort_by_key(|post| post.id),
		}

		Ok(page(posts, offset, limit))
	}

	async fn count(&self, predicate: PostPredicate) -> Result<i64> {
		let count = self
			.tables()
			.posts
			.iter()
			.filter(|post| predicate.matches(post))
			.count();

		Ok(i64::try_from(count).unwrap_or(i64::MAX))
	}
}

#[axum::async_trait]
impl UserGateway for MemoryStore {
	async fn create(&self, input: CreateUserInput, password_hash: String) -> Result<User> {
		input.validate()?;

		let mut tables = self.tables();

		if tables
			.users
			.iter()
			.any(|user| user.email.eq_ignore_ascii_case(&input.email))
		{
			return Err(Error::Constraint("email already taken"));
		}

		let user = User {
			id: tables.next_id(),
			name: input.name,
			email: input.email,
			permission: input.permission,
			password: password_hash,
			verified: true,
			created_at: Utc::now(),
		};

		tables.users.push(user.clone());
		Ok(user)
	}

	async fn get(&self, id: i64) -> Result<User> {
		self.tables()
			.users
			.iter()
			.find(|user| user.id == id)
			.cloned()
			.ok_or(Error::NotFound { entity: "user", id })
	}

	async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
		Ok(self
			.tables()
			.users
			.iter()
			.find(|user| user.email.eq_ignore_ascii_case(email))
			.cloned())
	}

	async fn update(&self, id: i64, patch: UpdateUserInput) -> Result<User> {
		patch.validate()?;

		let mut tables = self.tables();
		let user = tables
			.users
			.iter_mut()
			.find(|user| user.id == id)
			.ok_or(Error::NotFound { entity: "user", id })?;

		if let Some(name) = patch.name {
			user.name = name;
		}

		if let Some(email) = patch.email {
			user.email = email;
		}

		if let Some(permission) = patch.permission {
			user.permission = permission;
		}

		Ok(user.clone())
	}

	async fn delete(&self, id: i64) -> Result<()> {
		let mut tables = self.tables();
		let before = tables.users.len();

		tables.users.retain(|user| user.id != id);
		tables.sessions.retain(|_, user_id| *user_id != id);

		if tables.users.len() == before {
			return Err(Error::NotFound { entity: "user", id });
		}

		Ok(())
	}

	async fn list(&self, order: Order, offset: i64, limit: i64) -> Result<Vec<User>> {
		let mut users = self.tables().users.clone();

		match order {
			Order::Newest => users.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id))),
			Order::IdAscending => users.sort_by_key(|user| user.id),
		}

		Ok(page(users, offset, limit))
	}

	async fn count(&self) -> Result<i64> {
		Ok(i64::try_from(self.tables().users.len()).unwrap_or(i64::MAX))
	}
}

#[axum::async_trait]
impl ContactGateway for MemoryStore {
	async fn create(&self, input: CreateContactInput) -> Result<Contact> {
		input.validate()?;

		let mut tables = self.tables();
		let contact = Contact {
			id: tables.next_id(),
			email: input.email,
			link: input.link,
			kind: input.kind,
			message: input.message,
			created_at: Utc::now(),
		};

		tables.contacts.push(contact.clone());
		Ok(contact)
	}

	async fn get(&self, id: i64) -> Result<Contact> {
		self.tables()
			.contacts
			.iter()
			.find(|contact| contact.id == id)
			.cloned()
			.ok_or(Error::NotFound {
				entity: "contact",
				id,
			})
	}

	async fn update(&self, id: i64, patch: UpdateContactInput) -> Result<Contact> {
		patch.validate()?;

		let mut tables = self.tables();
		let contact = tables
			.contacts
			.iter_mut()
			.find(|contact| contact.id == id)
			.ok_or(Error::NotFound {
				entity: "contact",
				id,
			})?;

		if let Some(email) = patch.email {
			contact.email = email;
		}

		if let Some(link) = patch.link {
			contact.link = link;
		}

		if let Some(kind) = patch.kind {
			contact.kind = kind;
		}

		if let Some(message) = patch.message {
			contact.message = message;
		}

		Ok(contact.clone())
	}

	async fn delete(&self, id: i64) -> Result<()> {
		let mut tables = self.tables();
		let before = tables.contacts.len();

		tables.contacts.retain(|contact| contact.id != id);

		if tables.contacts.len() == before {
			return Err(Error::NotFound {
				entity: "contact",
				id,
			});
		}

		Ok(())
	}

	async fn list(&self, order: Order, offset: i64, limit: i64) -> Result<Vec<Contact>> {
		let mut contacts = self.tables().contacts.clone();

		match order {
			Order::Newest => {
				contacts.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
			}
			Order::IdAscending => contacts.sort_by_key(|contact| contact.id),
		}

		Ok(page(contacts, offset, limit))
	}

	async fn count(&self) -> Result<i64> {
		Ok(i64::try_from(self.tables().contacts.len()).unwrap_or(i64::MAX))
	}
}

#[axum::async_trait]
impl SessionGateway for MemoryStore {
	async fn create(&self, user_id: i64) -> Result<Uuid> {
		let mut tables = self.tables();

		if !tables.users.iter().any(|user| user.id == user_id) {
			return Err(Error::Constraint("referenced row missing"));
		}

		let id = Uuid::new_v4();

		tables.sessions.insert(id, user_id);
		Ok(id)
	}

	async fn find_user(&self, session_id: Uuid) -> Result<Option<User>> {
		let tables = self.tables();
		let Some(user_id) = tables.sessions.get(&session_id) else {
			return Ok(None);
		};

		Ok(tables.users.iter().find(|user| user.id == *user_id).cloned())
	}

	async fn delete(&self, session_id: Uuid) -> Result<()> {
		self.tables().sessions.remove(&session_id);
		Ok(())
	}
}
