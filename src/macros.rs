/// Declare typed wrappers over host table slots.
///
/// Each entry expands to a function that resolves its slot, reinterprets it
/// as `unsafe extern "C" fn(<args>) -> <ret>` and forwards the arguments
/// untouched. Entries written as `pub unsafe fn` stay `unsafe` for the
/// caller (they take raw pointers); plain `pub fn` entries are safe once the
/// table is installed.
macro_rules! host_fns {
    () => {};

    (
        $(#[$meta:meta])*
        pub fn $name:ident($($arg:ident: $ty:ty),* $(,)?) $(-> $ret:ty)? => $tag:ident;
        $($rest:tt)*
    ) => {
        $(#[$meta])*
        #[inline]
        pub fn $name($($arg: $ty),*) $(-> $ret)? {
            // SAFETY: the installed table follows the firmware layout, so
            // this slot holds a function of exactly this signature.
            unsafe {
                $crate::table::resolve::<unsafe extern "C" fn($($ty),*) $(-> $ret)?>(
                    $crate::table::Tag::$tag,
                )($($arg),*)
            }
        }

        host_fns!($($rest)*);
    };

    (
        $(#[$meta:meta])*
        pub unsafe fn $name:ident($($arg:ident: $ty:ty),* $(,)?) $(-> $ret:ty)? => $tag:ident;
        $($rest:tt)*
    ) => {
        $(#[$meta])*
        #[inline]
        pub unsafe fn $name($($arg: $ty),*) $(-> $ret)? {
            // SAFETY: slot layout as above; pointer validity is the caller's.
            unsafe {
                $crate::table::resolve::<unsafe extern "C" fn($($ty),*) $(-> $ret)?>(
                    $crate::table::Tag::$tag,
                )($($arg),*)
            }
        }

        host_fns!($($rest)*);
    };
}
