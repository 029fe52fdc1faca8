use crate::{Arguments, Dependency, InjectResult, Injectable, Service};

/// A plain function which can be bound as an injectable. All functions of
/// arity 12 or less are automatically injectable functions if each parameter
/// is a valid [`Dependency`] and the return value is a valid service type.
/// Parameters are filled positionally from the declared dependency names.
///
/// ## Type parameters
/// * `D` - Tuple of this function's parameters.
///
/// ## Example
///
/// ```
/// use lazy_injector::{Arguments, InjectableFn, Svc};
///
/// struct Greeting(String);
///
/// # fn _no_run() {
/// fn greet(name: Svc<String>) -> Greeting {
///     Greeting(format!("ola {}", name))
/// }
/// let arguments: Arguments = todo!();
/// greet.invoke(&arguments);
/// # }
/// ```
pub trait InjectableFn<D>: Service {
    /// The instance produced by invoking this function.
    type Result: Service;

    /// Invokes this function with its resolved dependencies.
    fn invoke(&self, arguments: &Arguments) -> InjectResult<Self::Result>;
}

macro_rules! impl_injectable_function {
    () => {
        impl_injectable_function!(@impl ());
    };
    ($first:ident $(, $rest:ident)*) => {
        impl_injectable_function!(@impl ($first $(, $rest)*));
        impl_injectable_function!($($rest),*);
    };
    (@impl ($($type_name:ident),*)) => {
        impl<F, R $(, $type_name)*> InjectableFn<($($type_name,)*)> for F
        where
            F: Service + Fn($($type_name),*) -> R,
            R: Service,
            $($type_name: Dependency,)*
        {
            type Result = R;

            #[allow(unused_variables, unused_mut, unused_assignments, non_snake_case)]
            fn invoke(&self, arguments: &Arguments) -> InjectResult<Self::Result> {
                let mut index = 0;
                let result = self($(
                    {
                        let dependency = <$type_name as Dependency>::from_argument(arguments, index)?;
                        index += 1;
                        dependency
                    }
                ),*);
                Ok(result)
            }
        }
    };
}

impl_injectable_function!(T0, T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11);

/// Defines a conversion into an [`Injectable`]. This trait is automatically
/// implemented for all injectable functions.
pub trait IntoInjectable<D> {
    /// Binds this function's parameters to the given dependency names, in
    /// order. The function's return value becomes the resolved instance.
    ///
    /// ## Example
    ///
    /// ```
    /// use lazy_injector::{constant, Container, IntoInjectable, Svc};
    ///
    /// struct Greeter {
    ///     greeting: Svc<&'static str>,
    /// }
    ///
    /// let container = Container::new();
    /// let module = container.module("greetings").into_module().unwrap();
    /// module
    ///     .value("greeting", constant("ola"))
    ///     .service(
    ///         "greeter",
    ///         (|greeting: Svc<&'static str>| Greeter { greeting }).inject(&["greeting"]),
    ///     );
    ///
    /// let greeter: Svc<Greeter> = module.get_service("greeter").unwrap();
    /// assert_eq!("ola", *greeter.greeting);
    /// ```
    #[must_use]
    fn inject(self, dependencies: &[&str]) -> Injectable;
}

impl<D, F> IntoInjectable<D> for F
where
    F: InjectableFn<D>,
{
    fn inject(self, dependencies: &[&str]) -> Injectable {
        Injectable::returning(dependencies, move |arguments| {
            self.invoke(arguments)
        })
    }
}
