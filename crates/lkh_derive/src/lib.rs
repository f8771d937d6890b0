mod keyword;
mod with_methods;

use proc_macro::TokenStream;

/// Renders and parses unit enums as TSPLIB / LKH keywords.
#[proc_macro_derive(LkhKeyword, attributes(lkh))]
pub fn derive_lkh_keyword(input: TokenStream) -> TokenStream {
    keyword::derive_lkh_keyword_inner(input)
}

/// Generates `with_<field>` builder setters.
#[proc_macro_derive(WithMethods, attributes(with))]
pub fn derive_with_methods(input: TokenStream) -> TokenStream {
    with_methods::derive_with_methods_inner(input)
}
