//! Declarative construction of state groups.

/// Declares a [`StatesGroup`](crate::StatesGroup) with a typed accessor
/// per state.
///
/// ```rust,ignore
/// use colloquy_fsm::states_group;
///
/// states_group! {
///     /// Steps of the registration dialogue.
///     pub group Registration {
///         waiting_name,
///         waiting_age,
///     }
/// }
///
/// let state = Registration::waiting_name(); // "Registration:waiting_name"
/// let group = Registration::group();        // &'static StatesGroup
/// ```
///
/// The macro covers the flat case; for nested hierarchies, attach built
/// groups with [`GroupBuilder::child`](crate::GroupBuilder::child).
#[macro_export]
macro_rules! states_group {
    (
        $(#[$meta:meta])*
        $vis:vis group $name:ident {
            $($state:ident),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        $vis struct $name;

        impl $name {
            /// Returns the group definition, built once on first use.
            $vis fn group() -> &'static $crate::StatesGroup {
                static GROUP: ::std::sync::OnceLock<$crate::StatesGroup> =
                    ::std::sync::OnceLock::new();
                GROUP.get_or_init(|| {
                    $crate::StatesGroup::builder(stringify!($name))
                        $(.state(stringify!($state)))+
                        .build()
                })
            }

            $(
                $vis fn $state() -> $crate::State {
                    $crate::State::with_group(stringify!($state), stringify!($name))
                }
            )+
        }
    };
}
