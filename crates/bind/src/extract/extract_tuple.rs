use crate::extract::Param;
use crate::handler::{BindCx, Scope, Source};
use crate::{BindError, ConfigError};
use std::any::type_name;

/// The argument tuple of a handler or provider.
pub trait ParamList: Sized + Send + 'static {
    fn type_names() -> Vec<&'static str>;

    /// Plans every parameter, left to right
    ///
    /// # Errors
    /// The first parameter that has no source.
    fn plan(scope: &mut Scope<'_>) -> Result<Vec<Source>, ConfigError>;

    /// Builds the tuple from a plan produced by [`ParamList::plan`]
    ///
    /// # Errors
    /// The first parameter that fails to bind.
    fn bind(plan: &[Source], cx: &BindCx<'_>) -> Result<Self, BindError>;
}

macro_rules! impl_param_list_for_tuple {
    ($($param:ident)*) => {
        impl<$($param,)*> ParamList for ($($param,)*)
        where
            $($param: Param,)*
        {
            fn type_names() -> Vec<&'static str> {
                vec![$(type_name::<$param>(),)*]
            }

            #[allow(unused_variables)]
            fn plan(scope: &mut Scope<'_>) -> Result<Vec<Source>, ConfigError> {
                Ok(vec![$({
                    scope.next_position();
                    <$param as Param>::plan(scope)?
                },)*])
            }

            #[allow(non_snake_case, unused_variables)]
            fn bind(plan: &[Source], cx: &BindCx<'_>) -> Result<Self, BindError> {
                let [$($param,)*] = plan else {
                    return Err(BindError::unavailable(type_name::<Self>()));
                };
                Ok(($(<$param as Param>::bind($param, cx)?,)*))
            }
        }
    };
}

impl_param_list_for_tuple! {}
impl_param_list_for_tuple! { A }
impl_param_list_for_tuple! { A B }
impl_param_list_for_tuple! { A B C }
impl_param_list_for_tuple! { A B C D }
impl_param_list_for_tuple! { A B C D E }
impl_param_list_for_tuple! { A B C D E F }
impl_param_list_for_tuple! { A B C D E F G }
impl_param_list_for_tuple! { A B C D E F G H }
impl_param_list_for_tuple! { A B C D E F G H I }
impl_param_list_for_tuple! { A B C D E F G H I J }
impl_param_list_for_tuple! { A B C D E F G H I J K }
impl_param_list_for_tuple! { A B C D E F G H I J K L }
