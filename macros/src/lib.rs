mod model;
mod route;

use proc_macro::TokenStream;

/// Creates a documentation function for the route, named after the original function with the suffix `_docs`.
///
/// The first line of the doc comment becomes the operation summary, the remaining lines the description.
#[proc_macro_attribute]
pub fn route(args: TokenStream, input: TokenStream) -> TokenStream {
	route::from_input(args, input)
}

/// Creates two new structs for the model: `CreateXInput` and `UpdateXInput`.
///
/// Fields with `#[serde(skip_deserializing)]` or `#[serde(skip)]` are left out of both.
/// The update struct wraps every remaining field in an `Option`, so it acts as a patch
/// where `None` means "leave unchanged".
#[proc_macro_attribute]
pub fn model(_args: TokenStream, input: TokenStream) -> TokenStream {
	model::from_input(input)
}
