//! Constructor selection.

use crate::catalog::{ConstructorInfo, TypeInfo};
use crate::error::{DiError, DiResult};
use crate::TypeToken;

/// Picks the constructor the engine will invoke for `info`.
///
/// An explicit parameter list (possibly empty) must match a constructor of
/// any visibility exactly. Otherwise only public constructors compete: a
/// single preferred one wins outright, else the greediest (or leanest) by
/// parameter count, ties going to the first described.
pub(crate) fn select_constructor(
    info: &TypeInfo,
    explicit: Option<&[TypeToken]>,
    prefer_greediest: bool,
) -> DiResult<ConstructorInfo> {
    if let Some(params) = explicit {
        return info
            .constructors()
            .iter()
            .find(|ctor| ctor.matches(params))
            .cloned()
            .ok_or_else(|| DiError::ConstructorMismatch {
                service: info.token().to_string(),
                params: params.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "),
            });
    }

    let public: Vec<&ConstructorInfo> = info.constructors().iter().filter(|c| c.is_public()).collect();
    if public.is_empty() {
        return Err(DiError::NoConstructor(info.token().to_string()));
    }

    let preferred: Vec<&ConstructorInfo> = public.iter().copied().filter(|c| c.is_preferred()).collect();
    match preferred.len() {
        0 => {}
        1 => return Ok(preferred[0].clone()),
        _ => return Err(DiError::AmbiguousConstructor(info.token().to_string())),
    }

    let mut best = public[0];
    for &candidate in &public[1..] {
        let better = if prefer_greediest {
            candidate.arity() > best.arity()
        } else {
            candidate.arity() < best.arity()
        };
        if better {
            best = candidate;
        }
    }
    Ok(best.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ParamInfo, TypeInfo};

    struct Dep;
    struct Other;

    #[derive(Debug, PartialEq)]
    struct Target(&'static str);

    fn target() -> TypeInfo {
        TypeInfo::concrete::<Target>()
            .constructor([], |_| Ok(Target("()")))
            .constructor([ParamInfo::of::<Dep>()], |_| Ok(Target("(Dep)")))
            .constructor([ParamInfo::of::<Other>()], |_| Ok(Target("(Other)")))
            .non_public_constructor([ParamInfo::of::<Dep>(), ParamInfo::of::<Other>()], |_| {
                Ok(Target("(Dep, Other)"))
            })
            .build()
    }

    #[test]
    fn greediest_public_wins_and_ties_go_first() {
        let ctor = select_constructor(&target(), None, true).unwrap();
        assert_eq!(ctor.params(), &[ParamInfo::of::<Dep>()]);
    }

    #[test]
    fn leanest_when_not_greedy() {
        let ctor = select_constructor(&target(), None, false).unwrap();
        assert_eq!(ctor.arity(), 0);
    }

    #[test]
    fn explicit_may_pick_non_public() {
        let params = [TypeToken::of::<Dep>(), TypeToken::of::<Other>()];
        let ctor = select_constructor(&target(), Some(&params), true).unwrap();
        assert!(!ctor.is_public());
    }

    #[test]
    fn explicit_empty_list_means_parameterless() {
        let ctor = select_constructor(&target(), Some(&[]), true).unwrap();
        assert_eq!(ctor.arity(), 0);
    }

    #[test]
    fn explicit_mismatch_is_register_error() {
        let err = select_constructor(&target(), Some(&[TypeToken::of::<u64>()]), true).unwrap_err();
        assert!(matches!(err, DiError::ConstructorMismatch { .. }));
        assert!(err.is_register_error());
    }

    #[test]
    fn preferred_overrides_arity() {
        let info = TypeInfo::concrete::<Target>()
            .constructor([ParamInfo::of::<Dep>(), ParamInfo::of::<Other>()], |_| Ok(Target("wide")))
            .preferred_constructor([], |_| Ok(Target("marked")))
            .build();
        assert_eq!(select_constructor(&info, None, true).unwrap().arity(), 0);
    }

    #[test]
    fn two_preferred_is_ambiguous() {
        let info = TypeInfo::concrete::<Target>()
            .preferred_constructor([], |_| Ok(Target("a")))
            .preferred_constructor([ParamInfo::of::<Dep>()], |_| Ok(Target("b")))
            .build();
        assert!(matches!(
            select_constructor(&info, None, true),
            Err(DiError::AmbiguousConstructor(_))
        ));
    }

    #[test]
    fn no_public_constructor() {
        let info = TypeInfo::concrete::<Target>()
            .non_public_constructor([], |_| Ok(Target("hidden")))
            .build();
        assert!(matches!(select_constructor(&info, None, true), Err(DiError::NoConstructor(_))));
    }
}
