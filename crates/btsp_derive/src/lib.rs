//! Derives for the BTSP option table and run reports.

mod cli_options;
mod cli_value;
mod kv_display;
mod timer;
mod utils;

use proc_macro::TokenStream;

/// Logs `"<label>: done in X.XXs"` at debug level when the annotated fn returns.
#[proc_macro_attribute]
pub fn timer(attr: TokenStream, item: TokenStream) -> TokenStream {
    timer::timer_inner(attr, item)
}

/// Kebab-case parsing and display for fieldless enums used as option
/// values. `#[cli_value(option = "mode")]` names the option in errors;
/// `#[cli(name = "..", alias = "..")]` overrides a variant's spelling.
#[proc_macro_derive(CliValue, attributes(cli_value, cli))]
pub fn derive_cli_value(item: TokenStream) -> TokenStream {
    cli_value::derive_cli_value_inner(item)
}

/// Generates `apply_cli_option` and `split_arg` from `#[cli(long = "..")]`
/// fields. `flag` fields also accept `--no-<name>`.
#[proc_macro_derive(CliOptions, attributes(cli))]
pub fn derive_cli_options(item: TokenStream) -> TokenStream {
    cli_options::derive_cli_options_inner(item)
}

/// `Display` as `key=value` pairs, see `#[kv(name, fmt, skip)]`.
#[proc_macro_derive(KvDisplay, attributes(kv))]
pub fn derive_kv_display(item: TokenStream) -> TokenStream {
    kv_display::derive_kv_display_inner(item)
}
