use std::collections::HashMap;

use formloom_domain::{Condition, Effect, Layout, LayoutKind, RequiredState};

use super::{ConditionEvaluator, EvaluationScope, Forest};

/// Set of effects, merged without regard to order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EffectSet {
    show: bool,
    hide: bool,
    enable: bool,
    disable: bool,
    require: bool,
}

impl EffectSet {
    /// Adds one effect.
    pub fn insert(&mut self, effect: Effect) {
        match effect {
            Effect::Show => self.show = true,
            Effect::Hide => self.hide = true,
            Effect::Enable => self.enable = true,
            Effect::Disable => self.disable = true,
            Effect::Require => self.require = true,
        }
    }

    /// Returns whether the effect is present.
    #[must_use]
    pub fn contains(&self, effect: Effect) -> bool {
        match effect {
            Effect::Show => self.show,
            Effect::Hide => self.hide,
            Effect::Enable => self.enable,
            Effect::Disable => self.disable,
            Effect::Require => self.require,
        }
    }

    /// Returns the union of both sets.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            show: self.show || other.show,
            hide: self.hide || other.hide,
            enable: self.enable || other.enable,
            disable: self.disable || other.disable,
            require: self.require || other.require,
        }
    }
}

impl FromIterator<Effect> for EffectSet {
    fn from_iter<I: IntoIterator<Item = Effect>>(effects: I) -> Self {
        let mut set = Self::default();
        for effect in effects {
            set.insert(effect);
        }
        set
    }
}

/// Final presentation state of one layout node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldState {
    /// Whether the node is rendered.
    pub visible: bool,
    /// Whether the node accepts edits.
    pub enabled: bool,
    /// Final requiredness.
    pub required: RequiredState,
}

impl FieldState {
    /// Reduces the effects declared on and fired for a layout into its state.
    ///
    /// `hide` beats `show` and `disable` beats `enable`. `require` always
    /// forces the node required. A layout that some `show` condition targets
    /// stays hidden until one fires; the same holds for `enable`. Read-only
    /// inputs start disabled.
    #[must_use]
    pub fn reduce(layout: &Layout, declared: EffectSet, fired: EffectSet) -> Self {
        let visible = if fired.hide {
            false
        } else if fired.show {
            true
        } else {
            !declared.show
        };

        let read_only_input = matches!(layout.kind(), LayoutKind::Input { .. })
            && layout.required() == RequiredState::Static;
        let enabled = if fired.disable {
            false
        } else if fired.enable {
            true
        } else {
            !declared.enable && !read_only_input
        };

        let required = if fired.require {
            RequiredState::Required
        } else {
            layout.required()
        };

        Self {
            visible,
            enabled,
            required,
        }
    }

    /// State of a node inside a hidden container or bound to an unknown column.
    #[must_use]
    pub fn suppressed(layout: &Layout) -> Self {
        Self {
            visible: false,
            enabled: false,
            required: layout.required(),
        }
    }
}

/// Groups effect-declaring conditions by the layout they target.
#[derive(Debug)]
pub struct EffectResolver<'a> {
    by_target: HashMap<&'a str, Vec<&'a Condition>>,
}

impl<'a> EffectResolver<'a> {
    /// Indexes every condition that declares an effect.
    ///
    /// Conditions excluded by a cycle are indexed too: their effects count as
    /// declared but never fire.
    #[must_use]
    pub fn new(conditions: &Forest<'a, Condition>) -> Self {
        let mut by_target: HashMap<&'a str, Vec<&'a Condition>> = HashMap::new();
        for condition in conditions.records() {
            if let Some(declaration) = condition.effect() {
                by_target
                    .entry(declaration.target_layout_id().as_str())
                    .or_default()
                    .push(condition);
            }
        }

        Self { by_target }
    }

    /// Returns the conditions targeting a layout.
    #[must_use]
    pub fn conditions_for(&self, layout_id: &str) -> &[&'a Condition] {
        self.by_target
            .get(layout_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Returns every effect declared on a layout, fired or not.
    #[must_use]
    pub fn declared(&self, layout_id: &str) -> EffectSet {
        self.conditions_for(layout_id)
            .iter()
            .filter_map(|condition| condition.effect())
            .map(|declaration| declaration.effect())
            .collect()
    }

    /// Evaluates the conditions targeting a layout and reduces their effects.
    #[must_use]
    pub fn resolve(
        &self,
        layout: &Layout,
        evaluator: &ConditionEvaluator<'_>,
        scope: EvaluationScope<'_>,
    ) -> FieldState {
        let conditions = self.conditions_for(layout.id().as_str());
        let fired = conditions
            .iter()
            .filter(|condition| evaluator.evaluate(condition, scope))
            .filter_map(|condition| condition.effect())
            .map(|declaration| declaration.effect())
            .collect();

        FieldState::reduce(layout, self.declared(layout.id().as_str()), fired)
    }
}
