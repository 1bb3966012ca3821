mod model;
mod route;

use proc_macro::TokenStream;

/// Creates a documentation function for the route, named after the original function with the suffix `_docs`.
///
/// The first line of the doc comment becomes the summary, the remaining lines the description.
#[proc_macro_attribute]
pub fn route(args: TokenStream, input: TokenStream) -> TokenStream {
	route::from_input(args, input)
}

/// Creates two new structs for the model: `CreateXInput` and `UpdateXInput`.
///
/// Fields with `#[serde(skip_deserializing)]` or `#[serde(skip)]` are left out of both, so
/// anything the server owns (ids, timestamps, counters) can never be written by a client.
/// Every field of `UpdateXInput` is wrapped in an [`Option`], and the struct gets an
/// `is_empty` method reporting whether no field was provided.
#[proc_macro_attribute]
pub fn model(_args: TokenStream, input: TokenStream) -> TokenStream {
	model::from_input(input)
}
