use quote::quote;
use syn::{AngleBracketedGenericArguments, GenericArgument, Path, PathArguments, Type, TypePath};

pub fn inner_of_option(ty: &Type) -> Option<&Type> {
    if let Type::Path(TypePath { path, .. }) = ty {
        let is_supported_option_path = match path.segments.len() {
            1 => path.segments[0].ident == "Option",
            3 => {
                (path.segments[0].ident == "std" || path.segments[0].ident == "core")
                    && path.segments[1].ident == "option"
                    && path.segments[2].ident == "Option"
            }
            _ => false,
        };
        if !is_supported_option_path {
            return None;
        }

        if let Some(seg) = path.segments.last()
            && let PathArguments::AngleBracketed(AngleBracketedGenericArguments { args, .. }) =
                &seg.arguments
            && let Some(GenericArgument::Type(t)) = args.first()
        {
            return Some(t);
        }
    }
    None
}

/// Parse expression for a CLI value stored in `raw`. `Option<T>` fields parse
/// as `T` and are wrapped in `Some`.
pub fn build_cli_parse_expr(ty: &Type, parse_with: Option<&Path>) -> proc_macro2::TokenStream {
    let (target, optional) = match inner_of_option(ty) {
        Some(inner) => (inner, true),
        None => (ty, false),
    };

    let parsed = if let Some(parse_with) = parse_with {
        quote! { #parse_with(&raw)? }
    } else {
        quote! {
            raw.parse::<#target>()
                .map_err(|e| crate::Error::invalid_input(format!(
                    "Invalid value for --{name}: {raw} ({e})"
                )))?
        }
    };

    if optional {
        quote! { Some(#parsed) }
    } else {
        parsed
    }
}

pub fn to_kebab_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for (idx, ch) in s.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if idx != 0 {
                out.push('-');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use syn::parse_quote;

    use super::{build_cli_parse_expr, inner_of_option, to_kebab_case};

    #[test]
    fn inner_of_option_supports_short_std_and_core_paths() {
        let short_ty: syn::Type = parse_quote!(Option<i64>);
        let std_ty: syn::Type = parse_quote!(std::option::Option<u8>);
        let core_ty: syn::Type = parse_quote!(core::option::Option<bool>);
        let non_opt: syn::Type = parse_quote!(Vec<String>);

        let short_inner = inner_of_option(&short_ty).expect("expected Option inner type");
        let std_inner = inner_of_option(&std_ty).expect("expected std Option inner type");
        let core_inner = inner_of_option(&core_ty).expect("expected core Option inner type");

        assert_eq!(quote::quote!(#short_inner).to_string(), "i64");
        assert_eq!(quote::quote!(#std_inner).to_string(), "u8");
        assert_eq!(quote::quote!(#core_inner).to_string(), "bool");
        assert!(inner_of_option(&non_opt).is_none());
    }

    #[test]
    fn parse_expr_wraps_optional_fields_in_some() {
        let opt_ty: syn::Type = parse_quote!(Option<i64>);
        let plain_ty: syn::Type = parse_quote!(usize);

        let opt_expr = build_cli_parse_expr(&opt_ty, None).to_string();
        let plain_expr = build_cli_parse_expr(&plain_ty, None).to_string();

        assert!(opt_expr.starts_with("Some"));
        assert!(opt_expr.contains("parse :: < i64 >"));
        assert!(!plain_expr.starts_with("Some"));
        assert!(plain_expr.contains("parse :: < usize >"));
    }

    #[test]
    fn to_kebab_case_inserts_dashes_before_ascii_uppercase() {
        assert_eq!(to_kebab_case("BaltspDt"), "baltsp-dt");
        assert_eq!(to_kebab_case("already-kebab"), "already-kebab");
        assert_eq!(to_kebab_case("X"), "x");
    }
}
