use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::{ItemFn, LitStr, parse_macro_input};

pub fn timer_inner(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut func = parse_macro_input!(item as ItemFn);

    let label = if attr.is_empty() {
        LitStr::new(&func.sig.ident.to_string(), Span::call_site())
    } else {
        parse_macro_input!(attr as LitStr)
    };

    let block = &func.block;
    let wrapped = quote! {
        {
            struct __TimerGuard(std::time::Instant);

            impl Drop for __TimerGuard {
                fn drop(&mut self) {
                    log::debug!(
                        "{}: done in {:.2}s",
                        #label,
                        self.0.elapsed().as_secs_f64()
                    );
                }
            }

            let __timer_guard = __TimerGuard(std::time::Instant::now());
            #block
        }
    };

    func.block = match syn::parse2(wrapped) {
        Ok(block) => Box::new(block),
        Err(err) => return err.to_compile_error().into(),
    };

    TokenStream::from(quote! { #func })
}
