use crate::{
	model::{Permission, User},
	Error,
};

/// Something a principal may be allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
	/// View posts, contacts and users.
	ReadContent,
	/// Create, edit and delete posts.
	WritePosts,
	/// Delete contact messages.
	ManageContacts,
	/// Change the permission of users.
	ManageUsers,
	/// Store files in the upload directory.
	UploadFiles,
}

impl Permission {
	pub fn allows(self, capability: Capability) -> bool {
		match (self, capability) {
			(Self::Editor, _) | (Self::Viewer, Capability::ReadContent) => true,
			(
				Self::Viewer,
				Capability::WritePosts
				| Capability::ManageContacts
				| Capability::ManageUsers
				| Capability::UploadFiles,
			) => false,
		}
	}
}

/// A capability known at compile time, used by the
/// [`Authorized`](crate::extract::Authorized) extractor.
pub trait Grant: Send + Sync + 'static {
	const CAPABILITY: Capability;
}

macro_rules! grants {
	($($name:ident),* $(,)?) => {
		$(
			#[derive(Debug)]
			pub struct $name;

			impl Grant for $name {
				const CAPABILITY: Capability = Capability::$name;
			}
		)*
	};
}

grants!(ReadContent, WritePosts, ManageContacts, ManageUsers, UploadFiles);

/// Fails with [`Error::Permission`] unless `user` holds `capability`.
pub fn require(user: &User, capability: Capability) -> Result<(), Error> {
	if user.permission.allows(capability) {
		return Ok(());
	}

	tracing::warn!(user = user.id, ?capability, "permission denied");

	Err(Error::Permission)
}
