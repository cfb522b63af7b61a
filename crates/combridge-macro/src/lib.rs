//! Procedural macros for the COM-style ABI bridge
//!
//! Provides:
//! - `#[com_interface("guid")]` - Define an interface rooted at `IUnknown`
//! - `#[com_interface("guid", extends(IBase))]` - Define a derived interface
//! - `#[com_implement(Interface)]` - Expose a struct behind an interface
//! - `#[com_implement(Interface, extends(IBase))]` - Expose behind a derived interface
//!
//! Every function-table entry uses the platform's C calling convention with
//! the object pointer as the implicit first argument. The generated vtable
//! struct embeds the base interface's vtable as its first field, so slot
//! offsets follow the flattened ancestor-then-self order that
//! `combridge::table::resolve` computes at runtime.
//!
//! `#[com_interface]` replaces the annotated trait with:
//! - an `IID_{NAME}` GUID constant parsed from the attribute
//! - a `{Name}VTable` repr(C) struct of function pointers
//! - a `{Name}` wrapper struct dispatching through the table
//! - `VTableLayout`, `ComInterface`, and `Deref`-to-base impls
//! - `{name}_forwarders!` / `{name}_base_vtable!` macros used when this
//!   interface serves as the base of another
//!
//! `#[com_implement]` generates one thunk per own slot, chains the base
//! interface's forwarder macros for inherited slots, builds a static vtable
//! for the (interface, impl) pair, and implements `ExposeAs`.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::parse::{Parse, ParseStream};
use syn::{
    parse_macro_input, spanned::Spanned, FnArg, Ident, ImplItem, ItemImpl, ItemTrait, LitStr, Pat,
    Token, TraitItem, Type,
};

// =============================================================================
// Attribute argument parsing
// =============================================================================

/// Arguments of `#[com_interface("guid")]` / `#[com_interface("guid", extends(IBase))]`
struct ComInterfaceArgs {
    guid: LitStr,
    base: Option<Ident>,
}

impl Parse for ComInterfaceArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let guid: LitStr = input.parse()?;
        let base = parse_extends(input)?;
        Ok(Self { guid, base })
    }
}

/// Arguments of `#[com_implement(IFoo)]` / `#[com_implement(IFoo, extends(IBase))]`
struct ComImplementArgs {
    interface: Ident,
    base: Option<Ident>,
}

impl Parse for ComImplementArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let interface: Ident = input.parse()?;
        let base = parse_extends(input)?;
        Ok(Self { interface, base })
    }
}

fn parse_extends(input: ParseStream) -> syn::Result<Option<Ident>> {
    if !input.peek(Token![,]) {
        return Ok(None);
    }
    input.parse::<Token![,]>()?;
    let keyword: Ident = input.parse()?;
    if keyword != "extends" {
        return Err(syn::Error::new(
            keyword.span(),
            format!("unknown option '{keyword}', expected 'extends(...)'"),
        ));
    }
    let content;
    syn::parenthesized!(content in input);
    let base: Ident = content.parse()?;
    Ok(Some(base))
}

/// Parse a GUID string in format "xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx".
/// Returns (data1, data2, data3, data4).
fn parse_guid_string(s: &str) -> Result<(u32, u16, u16, [u8; 8]), String> {
    let s = s.trim();
    let parts: Vec<&str> = s.split('-').collect();
    if parts.len() != 5 {
        return Err(format!(
            "Invalid GUID format: expected 'xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx', got '{s}'"
        ));
    }

    let data1 = u32::from_str_radix(parts[0], 16)
        .map_err(|_| format!("Invalid GUID data1: '{}'", parts[0]))?;
    let data2 = u16::from_str_radix(parts[1], 16)
        .map_err(|_| format!("Invalid GUID data2: '{}'", parts[1]))?;
    let data3 = u16::from_str_radix(parts[2], 16)
        .map_err(|_| format!("Invalid GUID data3: '{}'", parts[2]))?;

    if parts[3].len() != 4 {
        return Err(format!(
            "Invalid GUID data4 first part: expected 4 hex chars, got '{}'",
            parts[3]
        ));
    }
    if parts[4].len() != 12 {
        return Err(format!(
            "Invalid GUID data4 second part: expected 12 hex chars, got '{}'",
            parts[4]
        ));
    }

    let mut data4 = [0u8; 8];
    data4[0] = u8::from_str_radix(&parts[3][0..2], 16)
        .map_err(|_| format!("Invalid GUID data4[0]: '{}'", &parts[3][0..2]))?;
    data4[1] = u8::from_str_radix(&parts[3][2..4], 16)
        .map_err(|_| format!("Invalid GUID data4[1]: '{}'", &parts[3][2..4]))?;
    for i in 0..6 {
        data4[2 + i] = u8::from_str_radix(&parts[4][i * 2..i * 2 + 2], 16).map_err(|_| {
            format!(
                "Invalid GUID data4[{}]: '{}'",
                2 + i,
                &parts[4][i * 2..i * 2 + 2]
            )
        })?;
    }

    Ok((data1, data2, data3, data4))
}

// =============================================================================
// Validation helpers for FFI-safety
// =============================================================================

/// Check if a type is known to be non-FFI-safe
fn check_ffi_safe_type(ty: &Type) -> Result<(), String> {
    match ty {
        Type::Path(type_path) => {
            if let Some(segment) = type_path.path.segments.last() {
                let name = segment.ident.to_string();
                match name.as_str() {
                    "String" => {
                        return Err(
                            "String is not FFI-safe. Use *const c_char or *const u8 instead".into(),
                        );
                    }
                    "Vec" => {
                        return Err(
                            "Vec<T> is not FFI-safe. Use *const T and a length parameter instead"
                                .into(),
                        );
                    }
                    "Box" => return Err("Box<T> is not FFI-safe. Use *mut T instead".into()),
                    "Rc" | "Arc" => {
                        return Err(format!("{name} is not FFI-safe. Use raw pointers instead"));
                    }
                    "Result" => return Err(
                        "Result<T, E> is not FFI-safe. Use HRESULT and out-parameters instead"
                            .into(),
                    ),
                    "str" => {
                        return Err(
                            "str is not FFI-safe. Use *const c_char or *const u8 instead".into(),
                        );
                    }
                    _ => {}
                }
            }
        }
        Type::Reference(type_ref) => {
            let mutability = if type_ref.mutability.is_some() {
                "&mut "
            } else {
                "&"
            };
            return Err(format!(
                "{mutability}T references are not recommended for FFI. Use *const T or *mut T \
                 instead. References have Rust-specific guarantees native code won't uphold"
            ));
        }
        Type::Slice(_) => {
            return Err(
                "Slices [T] are not FFI-safe. Use *const T and a length parameter instead".into(),
            );
        }
        Type::TraitObject(_) => {
            return Err("Trait objects (dyn Trait) are not FFI-safe".into());
        }
        Type::ImplTrait(_) => {
            return Err("impl Trait is not FFI-safe".into());
        }
        Type::Tuple(tuple) if !tuple.elems.is_empty() => {
            return Err(
                "Non-empty tuples are not FFI-safe. Use a #[repr(C)] struct instead".into(),
            );
        }
        _ => {}
    }
    Ok(())
}

/// Validate a method signature for function-table compatibility.
/// Shared by the interface and implementation macros.
fn validate_signature(sig: &syn::Signature) -> Result<(), syn::Error> {
    let method_name = &sig.ident;
    let span = method_name.span();

    if sig.asyncness.is_some() {
        return Err(syn::Error::new(
            span,
            format!("method '{method_name}': async functions are not supported in function tables"),
        ));
    }

    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new(
            span,
            format!("method '{method_name}': generic methods are not supported in function tables"),
        ));
    }

    let mut has_self = false;
    for arg in &sig.inputs {
        if let FnArg::Receiver(receiver) = arg {
            has_self = true;
            if receiver.reference.is_none() {
                return Err(syn::Error::new(
                    receiver.self_token.span(),
                    format!(
                        "method '{method_name}': self by value is not supported. Use &self or \
                         &mut self instead"
                    ),
                ));
            }
        }
    }
    if !has_self {
        return Err(syn::Error::new(
            span,
            format!(
                "method '{method_name}': must have &self or &mut self parameter (table methods \
                 require an object pointer)"
            ),
        ));
    }

    for arg in &sig.inputs {
        if let FnArg::Typed(pat_type) = arg
            && let Err(msg) = check_ffi_safe_type(&pat_type.ty)
        {
            return Err(syn::Error::new(
                pat_type.ty.span(),
                format!("method '{method_name}': {msg}"),
            ));
        }
    }

    if let syn::ReturnType::Type(_, ty) = &sig.output
        && let Err(msg) = check_ffi_safe_type(ty)
    {
        return Err(syn::Error::new(
            ty.span(),
            format!("method '{method_name}': return type - {msg}"),
        ));
    }

    Ok(())
}

// =============================================================================
// Method collection
// =============================================================================

struct MethodInfo {
    name: Ident,
    param_names: Vec<Ident>,
    param_types: Vec<Type>,
    output: syn::ReturnType,
}

fn collect_signature(sig: &syn::Signature) -> MethodInfo {
    let params: Vec<_> = sig
        .inputs
        .iter()
        .filter_map(|arg| {
            if let FnArg::Typed(pat_type) = arg
                && let Pat::Ident(pat_ident) = pat_type.pat.as_ref()
            {
                return Some((pat_ident.ident.clone(), (*pat_type.ty).clone()));
            }
            None
        })
        .collect();

    MethodInfo {
        name: sig.ident.clone(),
        param_names: params.iter().map(|(n, _)| n.clone()).collect(),
        param_types: params.iter().map(|(_, t)| t.clone()).collect(),
        output: sig.output.clone(),
    }
}

/// Qualify bridge types for use inside an emitted declarative macro, where
/// the original `use` scope of the interface definition no longer applies.
///
/// - `GUID` / `HRESULT` -> `combridge::GUID` / `combridge::HRESULT`
/// - `c_void` -> `::std::ffi::c_void`
fn qualify_type_for_macro(ty: &Type) -> TokenStream2 {
    match ty {
        Type::Path(type_path) => {
            if let Some(ident) = type_path.path.get_ident() {
                match ident.to_string().as_str() {
                    "GUID" | "HRESULT" => return quote! { combridge::#ident },
                    "c_void" => return quote! { ::std::ffi::c_void },
                    _ => {}
                }
            }
            quote! { #ty }
        }
        Type::Ptr(type_ptr) => {
            let inner = qualify_type_for_macro(&type_ptr.elem);
            if type_ptr.mutability.is_some() {
                quote! { *mut #inner }
            } else {
                quote! { *const #inner }
            }
        }
        _ => quote! { #ty },
    }
}

// =============================================================================
// #[com_interface] - interface definition
// =============================================================================

fn com_interface_internal(
    args: ComInterfaceArgs,
    input: ItemTrait,
) -> Result<TokenStream2, syn::Error> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new(
            input.generics.span(),
            "generic interfaces are not supported",
        ));
    }

    let (data1, data2, data3, data4) = parse_guid_string(&args.guid.value())
        .map_err(|msg| syn::Error::new(args.guid.span(), msg))?;
    let [d4_0, d4_1, d4_2, d4_3, d4_4, d4_5, d4_6, d4_7] = data4;

    let trait_name = &input.ident;
    let trait_name_str = trait_name.to_string();
    let vtable_name = format_ident!("{}VTable", trait_name);
    let iid_name = format_ident!("IID_{}", trait_name_str.to_uppercase());
    let vis = &input.vis;

    // Base interface: explicit `extends(...)` or the root IUnknown.
    let (base_ty, base_is_root) = match &args.base {
        Some(base) => (quote! { #base }, false),
        None => (quote! { combridge::IUnknown }, true),
    };

    let mut methods = Vec::new();
    for item in &input.items {
        if let TraitItem::Fn(method) = item {
            validate_signature(&method.sig)?;
            methods.push(collect_signature(&method.sig));
        }
    }

    // VTable fields and wrapper dispatch methods, in declaration order.
    let mut vtable_fields = Vec::new();
    let mut wrapper_methods = Vec::new();
    for method in &methods {
        let name = &method.name;
        let param_names = &method.param_names;
        let param_types = &method.param_types;
        let output = &method.output;

        vtable_fields.push(quote! {
            pub #name: unsafe extern "C" fn(
                this: *mut ::std::ffi::c_void
                #(, #param_names: #param_types)*
            ) #output
        });

        wrapper_methods.push(quote! {
            /// Dispatch through the object's function table.
            ///
            /// # Safety
            /// The object behind this wrapper must still be alive and its
            /// table must match this interface's layout.
            #[inline]
            pub unsafe fn #name(&self #(, #param_names: #param_types)*) #output {
                unsafe {
                    ((*self.vtable).#name)(
                        self as *const Self as *mut ::std::ffi::c_void
                        #(, #param_names)*
                    )
                }
            }
        });
    }

    let own_count = methods.len();

    // Descriptor entries for this interface's own methods.
    let method_sigs: Vec<_> = methods
        .iter()
        .map(|m| {
            let name_str = m.name.to_string();
            let arity = m.param_names.len();
            quote! {
                combridge::MethodSig {
                    name: #name_str,
                    arity: #arity,
                }
            }
        })
        .collect();

    // Forwarder and base-vtable macros so this interface can serve as a
    // base for derived implementations (teacher-style paste chaining).
    let interface_lower = trait_name_str.to_lowercase();
    let forwarders_macro_name = format_ident!("{}_forwarders", interface_lower);
    let base_vtable_macro_name = format_ident!("{}_base_vtable", interface_lower);

    let (base_forwarders_invocation, base_vtable_invocation) = if base_is_root {
        (
            quote! { combridge::iunknown_forwarders!($struct_name, $struct_type, $interface_name); },
            quote! { combridge::iunknown_base_vtable!($struct_name, $interface_name) },
        )
    } else {
        let base = args.base.as_ref().unwrap();
        let base_lower = base.to_string().to_lowercase();
        let base_forwarders = format_ident!("{}_forwarders", base_lower);
        let base_vtable = format_ident!("{}_base_vtable", base_lower);
        (
            quote! { #base_forwarders!($struct_name, $struct_type, $interface_name); },
            quote! { #base_vtable!($struct_name, $interface_name) },
        )
    };

    let mut forwarder_wrappers = Vec::new();
    let mut vtable_entries = Vec::new();
    for method in &methods {
        let name = &method.name;
        let param_names = &method.param_names;
        let qualified_types: Vec<_> = method
            .param_types
            .iter()
            .map(qualify_type_for_macro)
            .collect();
        let qualified_output = match &method.output {
            syn::ReturnType::Default => quote! {},
            syn::ReturnType::Type(arrow, ty) => {
                let ty = qualify_type_for_macro(ty);
                quote! { #arrow #ty }
            }
        };

        forwarder_wrappers.push(quote! {
            #[allow(non_snake_case)]
            unsafe extern "C" fn [<__ $struct_name __ $interface_name __ #name>](
                this: *mut ::std::ffi::c_void
                #(, #param_names: #qualified_types)*
            ) #qualified_output {
                unsafe {
                    let object =
                        combridge::expose::exposed_object_ptr::<$struct_type>(this);
                    (*object).#name(#(#param_names),*)
                }
            }
        });

        vtable_entries.push(quote! {
            #name: [<__ $struct_name __ $interface_name __ #name>]
        });
    }

    let forwarders_macro = quote! {
        /// Auto-generated forwarder macro for this interface.
        ///
        /// Expands to one thunk per own method that recovers the exposed
        /// object from the record handle and forwards the call. Chains the
        /// base interface's forwarder macro first, so a single invocation
        /// covers the whole ancestor chain.
        #[macro_export]
        macro_rules! #forwarders_macro_name {
            ($struct_name:ident, $struct_type:ty, $interface_name:ident) => {
                #base_forwarders_invocation

                combridge::paste! {
                    #(#forwarder_wrappers)*
                }
            };
        }
    };

    let base_vtable_macro = quote! {
        /// Auto-generated base-vtable initializer for this interface.
        ///
        /// Evaluates to a vtable struct literal wiring every slot to the
        /// thunks produced by the matching forwarders macro; the base field
        /// comes from the parent interface's initializer, recursively.
        #[macro_export]
        macro_rules! #base_vtable_macro_name {
            ($struct_name:ident, $interface_name:ident) => {
                combridge::paste! {
                    #vtable_name {
                        base: #base_vtable_invocation,
                        #(#vtable_entries),*
                    }
                }
            };
        }
    };

    let expanded = quote! {
        /// Interface ID (GUID) for this interface
        #vis const #iid_name: combridge::GUID = combridge::GUID::new(
            #data1,
            #data2,
            #data3,
            [#d4_0, #d4_1, #d4_2, #d4_3, #d4_4, #d4_5, #d4_6, #d4_7],
        );

        /// Function table for this interface: base table embedded first,
        /// own methods following in declaration order.
        #[repr(C)]
        #vis struct #vtable_name {
            /// Inherited base interface vtable
            pub base: <#base_ty as combridge::VTableLayout>::VTable,
            #(#vtable_fields),*
        }

        /// Interface wrapper over a raw object pointer
        #[repr(C)]
        #vis struct #trait_name {
            vtable: *const #vtable_name,
        }

        impl #trait_name {
            /// Get the interface ID (GUID) for this interface
            #[inline]
            #[must_use]
            pub const fn iid() -> &'static combridge::GUID {
                &#iid_name
            }

            /// Get the vtable
            #[inline]
            #[must_use]
            pub fn vtable(&self) -> &#vtable_name {
                unsafe { &*self.vtable }
            }

            /// Wrap a raw pointer for calling methods.
            ///
            /// # Safety
            /// - `ptr` must point to a valid object with a compatible
            ///   function-table layout
            /// - The returned reference must not outlive the underlying object
            /// - No mutable references to the same object may exist concurrently
            #[inline]
            pub unsafe fn from_ptr<'a>(ptr: *mut ::std::ffi::c_void) -> &'a Self {
                unsafe { &*(ptr as *const Self) }
            }

            /// Wrap a raw pointer for calling methods (mutable).
            ///
            /// # Safety
            /// - Same as `from_ptr`, and no other references to the same
            ///   object may exist concurrently
            #[inline]
            pub unsafe fn from_ptr_mut<'a>(ptr: *mut ::std::ffi::c_void) -> &'a mut Self {
                unsafe { &mut *(ptr as *mut Self) }
            }

            #(#wrapper_methods)*
        }

        impl ::std::ops::Deref for #trait_name {
            type Target = #base_ty;

            /// Ancestor methods are reachable directly on a derived wrapper:
            /// the table prefix is exactly the base interface's table.
            #[inline]
            fn deref(&self) -> &Self::Target {
                unsafe { &*(self as *const Self as *const Self::Target) }
            }
        }

        impl combridge::VTableLayout for #trait_name {
            const SLOT_COUNT: usize =
                <#base_ty as combridge::VTableLayout>::SLOT_COUNT + #own_count;
            type VTable = #vtable_name;
        }

        impl combridge::ComInterface for #trait_name {
            const IID: combridge::GUID = #iid_name;

            fn descriptor() -> &'static combridge::InterfaceDescriptor {
                static DESCRIPTOR: combridge::InterfaceDescriptor =
                    combridge::InterfaceDescriptor {
                        name: #trait_name_str,
                        iid: #iid_name,
                        methods: &[#(#method_sigs),*],
                        base: Some(
                            <#base_ty as combridge::ComInterface>::descriptor,
                        ),
                    };
                &DESCRIPTOR
            }
        }

        #forwarders_macro
        #base_vtable_macro
    };

    Ok(expanded)
}

/// Define an interface.
///
/// Replaces the annotated trait with a vtable struct, a wrapper struct with
/// per-slot dispatch methods, an IID constant, descriptor metadata, and the
/// chaining macros used when this interface is a base of another.
///
/// # Example
/// ```ignore
/// #[com_interface("12345678-1234-1234-1234-123456789abc")]
/// pub trait IBlob {
///     fn buffer_size(&self) -> usize;
/// }
///
/// #[com_interface("87654321-4321-4321-4321-cba987654321", extends(IBlob))]
/// pub trait IEncodedBlob {
///     fn encoding(&self) -> i32;
/// }
/// ```
#[proc_macro_attribute]
pub fn com_interface(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as ComInterfaceArgs);
    let input = parse_macro_input!(item as ItemTrait);
    match com_interface_internal(args, input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

// =============================================================================
// #[com_implement] - exposing a struct behind an interface
// =============================================================================

fn com_implement_internal(
    args: ComImplementArgs,
    input: ItemImpl,
) -> Result<TokenStream2, syn::Error> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new(
            input.generics.span(),
            "generic impl blocks are not supported",
        ));
    }

    let interface_name = &args.interface;
    let vtable_name = format_ident!("{}VTable", interface_name);
    let struct_type = &input.self_ty;
    let struct_name = match struct_type.as_ref() {
        Type::Path(type_path) => type_path.path.segments.last().unwrap().ident.clone(),
        _ => return Err(syn::Error::new(struct_type.span(), "Expected a type path")),
    };

    let mut methods = Vec::new();
    let mut original_methods = Vec::new();
    for item in &input.items {
        if let ImplItem::Fn(method) = item {
            validate_signature(&method.sig)?;
            methods.push(collect_signature(&method.sig));
            original_methods.push(method.clone());
        }
    }

    // Thunks for this interface's own slots. Inherited slots come from the
    // base chain's forwarder macros below.
    let mut wrapper_fns = Vec::new();
    let mut vtable_entries = Vec::new();
    for method in &methods {
        let name = &method.name;
        let wrapper_name = format_ident!("__{}__{}__{}", struct_name, interface_name, name);
        let param_names = &method.param_names;
        let param_types = &method.param_types;
        let output = &method.output;

        wrapper_fns.push(quote! {
            #[allow(non_snake_case)]
            unsafe extern "C" fn #wrapper_name(
                this: *mut ::std::ffi::c_void
                #(, #param_names: #param_types)*
            ) #output {
                unsafe {
                    let object =
                        combridge::expose::exposed_object_ptr::<#struct_type>(this);
                    (*object).#name(#(#param_names),*)
                }
            }
        });

        vtable_entries.push(quote! {
            #name: #wrapper_name
        });
    }

    // Base chain macros: the root supplies the shared lifetime thunks, a
    // user base interface supplies its own forwarders recursively.
    let (base_forwarders, base_vtable_entry) = match &args.base {
        None => (
            quote! {
                combridge::iunknown_forwarders!(#struct_name, #struct_type, #interface_name);
            },
            quote! {
                base: combridge::iunknown_base_vtable!(#struct_name, #interface_name)
            },
        ),
        Some(base) => {
            let base_lower = base.to_string().to_lowercase();
            let forwarders_macro = format_ident!("{}_forwarders", base_lower);
            let base_vtable_macro = format_ident!("{}_base_vtable", base_lower);
            (
                quote! {
                    #forwarders_macro!(#struct_name, #struct_type, #interface_name);
                },
                quote! {
                    base: #base_vtable_macro!(#struct_name, #interface_name)
                },
            )
        }
    };

    let vtable_static_name = format_ident!(
        "__{}_{}_VTABLE",
        struct_name.to_string().to_uppercase(),
        interface_name.to_string().to_uppercase()
    );

    let expanded = quote! {
        // Base chain thunks (lifetime slots and any inherited methods)
        #base_forwarders

        // Own-method thunks (private)
        #(#wrapper_fns)*

        // One static table per (interface, impl) pair; repeated exposures
        // of the same pair share it by reference identity.
        static #vtable_static_name: #vtable_name = #vtable_name {
            #base_vtable_entry,
            #(#vtable_entries),*
        };

        unsafe impl combridge::ExposeAs<#interface_name> for #struct_type {
            fn exposed_vtable() -> &'static #vtable_name {
                &#vtable_static_name
            }
        }

        // Original impl with the forwarded methods
        impl #struct_type {
            #(#original_methods)*
        }
    };

    Ok(expanded)
}

/// Expose a struct behind an interface.
///
/// The impl block lists the interface's own methods; methods of base
/// interfaces are pulled in through the base's forwarder macros and must
/// exist as inherent methods on the struct (typically from that base's own
/// `#[com_implement]` block).
///
/// Native code reaches the object through an `ExposureRecord`, so the
/// struct needs no vtable field and no particular layout.
///
/// # Example
/// ```ignore
/// #[com_implement(IBlob)]
/// impl MemoryBlob {
///     fn buffer_size(&self) -> usize {
///         self.bytes.len()
///     }
/// }
///
/// #[com_implement(IEncodedBlob, extends(IBlob))]
/// impl EncodedBlob {
///     fn encoding(&self) -> i32 {
///         self.encoding
///     }
/// }
/// ```
#[proc_macro_attribute]
pub fn com_implement(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as ComImplementArgs);
    let input = parse_macro_input!(item as ItemImpl);
    match com_implement_internal(args, input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
