use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::{Data, DeriveInput, Fields, LitStr, parse_macro_input, spanned::Spanned};

fn default_keyword(variant_ident: &syn::Ident, separator: &str) -> String {
    let name = variant_ident.to_string();
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(chars.len() * (separator.len().max(1) + 1));

    for (idx, ch) in chars.iter().copied().enumerate() {
        if idx > 0 {
            let prev = chars[idx - 1];
            let next = chars.get(idx + 1).copied();
            let is_word_boundary = ch.is_ascii_uppercase()
                && (prev.is_ascii_lowercase()
                    || prev.is_ascii_digit()
                    || (prev.is_ascii_uppercase() && next.is_some_and(|n| n.is_ascii_lowercase())));

            if is_word_boundary {
                out.push_str(separator);
            }
        }

        out.push(ch.to_ascii_uppercase());
    }

    out
}

fn parse_container_separator(input: &DeriveInput) -> syn::Result<String> {
    let mut separator = "-".to_string();

    for attr in &input.attrs {
        if !attr.path().is_ident("lkh") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("separator") {
                let lit: LitStr = meta.value()?.parse()?;
                separator = lit.value();
                return Ok(());
            }

            Err(meta.error("unsupported lkh attribute on enum; expected separator = \"...\""))
        })?;
    }

    Ok(separator)
}

/// Canonical keyword plus accepted aliases for one variant.
struct VariantKeywords {
    canonical: Option<String>,
    aliases: Vec<String>,
}

fn parse_variant_keywords(variant: &syn::Variant) -> syn::Result<VariantKeywords> {
    let mut keywords = VariantKeywords {
        canonical: None,
        aliases: Vec::new(),
    };

    for attr in &variant.attrs {
        if !attr.path().is_ident("lkh") {
            continue;
        }

        if let Ok(lit) = attr.parse_args::<LitStr>() {
            keywords.canonical = Some(lit.value());
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("value") {
                let lit: LitStr = meta.value()?.parse()?;
                keywords.canonical = Some(lit.value());
                return Ok(());
            }
            if meta.path.is_ident("alias") {
                let lit: LitStr = meta.value()?.parse()?;
                keywords.aliases.push(lit.value());
                return Ok(());
            }
            Err(meta.error("unsupported lkh attribute; expected \"...\", value or alias"))
        })?;
    }

    Ok(keywords)
}

pub fn derive_lkh_keyword_inner(item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    let enum_ident = input.ident.clone();
    let separator = match parse_container_separator(&input) {
        Ok(value) => value,
        Err(err) => return err.to_compile_error().into(),
    };

    let Data::Enum(data_enum) = input.data else {
        return syn::Error::new(input.span(), "LkhKeyword can only be derived for enums")
            .to_compile_error()
            .into();
    };

    let mut display_arms = Vec::new();
    let mut parse_arms = Vec::new();
    let mut expected = Vec::new();

    for variant in data_enum.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return syn::Error::new(variant.span(), "LkhKeyword only supports unit variants")
                .to_compile_error()
                .into();
        }

        let keywords = match parse_variant_keywords(&variant) {
            Ok(keywords) => keywords,
            Err(err) => return err.to_compile_error().into(),
        };
        let variant_ident = variant.ident;
        let canonical = keywords
            .canonical
            .unwrap_or_else(|| default_keyword(&variant_ident, &separator));

        let canonical_lit = LitStr::new(&canonical, Span::call_site());
        let mut accepted = vec![LitStr::new(
            &canonical.to_ascii_uppercase(),
            Span::call_site(),
        )];
        accepted.extend(
            keywords
                .aliases
                .iter()
                .map(|alias| LitStr::new(&alias.to_ascii_uppercase(), Span::call_site())),
        );
        expected.push(canonical);

        display_arms.push(quote! {
            Self::#variant_ident => #canonical_lit,
        });
        parse_arms.push(quote! {
            #(#accepted)|* => Ok(Self::#variant_ident),
        });
    }

    let type_name_lit = LitStr::new(&enum_ident.to_string(), Span::call_site());
    let expected_lit = LitStr::new(&expected.join("|"), Span::call_site());

    let expanded = quote! {
        impl std::fmt::Display for #enum_ident {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let val = match self {
                    #(#display_arms)*
                };
                write!(f, "{val}")
            }
        }

        impl std::str::FromStr for #enum_ident {
            type Err = crate::LkhError;

            fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
                match raw.trim().to_ascii_uppercase().as_str() {
                    #(#parse_arms)*
                    _ => Err(crate::LkhError::invalid_data(format!(
                        "Unsupported {} '{}' (expected {})",
                        #type_name_lit,
                        raw.trim(),
                        #expected_lit
                    ))),
                }
            }
        }
    };

    TokenStream::from(expanded)
}
