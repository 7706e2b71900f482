//! The `Context` owns everything a running simulation needs: module data
//! stored as type-keyed data plugins, a queue of timed plans, and the current
//! time. Modules extend `Context` through extension traits
//! (`ContextRandomExt`, `ContextPopulationExt`) rather than by adding fields.
//!
//! The core never decides *when* a tick happens. Whoever drives the context
//! schedules plans; each plan runs to completion before the next one starts.
use std::any::{Any, TypeId};

use log::{info, trace};

use crate::hashing::HashMap;
use crate::plan::{ExecutionPhase, PlanId, Queue};

/// A type that names a piece of module data stored in the `Context`.
pub trait DataPlugin: Any {
    type DataContainer;

    fn create_data_container() -> Self::DataContainer;
}

/// Defines a data plugin: a zero-sized key type plus the container it owns
/// and the expression used to create that container on first access.
#[macro_export]
macro_rules! define_data_plugin {
    ($plugin:ident, $data_container:ty, $default: expr) => {
        struct $plugin;

        impl $crate::context::DataPlugin for $plugin {
            type DataContainer = $data_container;

            fn create_data_container() -> Self::DataContainer {
                $default
            }
        }
    };
}
pub use define_data_plugin;

type Callback = dyn FnOnce(&mut Context);

pub struct Context {
    plan_queue: Queue<Box<Callback>>,
    data_plugins: HashMap<TypeId, Box<dyn Any>>,
    current_time: f64,
    shutdown_requested: bool,
}

impl Context {
    #[must_use]
    pub fn new() -> Context {
        Context {
            plan_queue: Queue::new(),
            data_plugins: HashMap::default(),
            current_time: 0.0,
            shutdown_requested: false,
        }
    }

    /// Schedules `callback` to run at `time` in the `Normal` phase.
    ///
    /// # Panics
    ///
    /// Panics if `time` is not finite or lies in the past.
    pub fn add_plan(&mut self, time: f64, callback: impl FnOnce(&mut Context) + 'static) -> PlanId {
        self.add_plan_with_phase(time, callback, ExecutionPhase::Normal)
    }

    /// Schedules `callback` to run at `time` in the given phase.
    ///
    /// # Panics
    ///
    /// Panics if `time` is not finite or lies in the past.
    pub fn add_plan_with_phase(
        &mut self,
        time: f64,
        callback: impl FnOnce(&mut Context) + 'static,
        phase: ExecutionPhase,
    ) -> PlanId {
        assert!(
            time.is_finite() && time >= self.current_time,
            "Time {time} is invalid"
        );
        self.plan_queue.add_plan(time, Box::new(callback), phase)
    }

    pub fn cancel_plan(&mut self, id: &PlanId) {
        self.plan_queue.cancel_plan(id);
    }

    /// Gets the data container for `plugin`, if anything has created it yet.
    #[must_use]
    pub fn get_data<T: DataPlugin>(&self, _plugin: T) -> Option<&T::DataContainer> {
        self.data_plugins
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref::<T::DataContainer>())
    }

    /// Gets the data container for `plugin`, creating it on first access.
    pub fn get_data_mut<T: DataPlugin>(&mut self, _plugin: T) -> &mut T::DataContainer {
        self.data_plugins
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(T::create_data_container()))
            .downcast_mut::<T::DataContainer>()
            .expect("data plugin stored under the wrong type")
    }

    #[must_use]
    pub fn get_current_time(&self) -> f64 {
        self.current_time
    }

    /// Stops `execute` after the currently running plan returns. Pending plans
    /// are dropped.
    pub fn shutdown(&mut self) {
        info!("shutdown requested at t={}", self.current_time);
        self.shutdown_requested = true;
    }

    /// Runs plans in time order until the queue is empty or a plan calls
    /// `shutdown`.
    pub fn execute(&mut self) {
        trace!("entering event loop");
        while let Some(plan) = self.plan_queue.get_next_plan() {
            self.current_time = plan.time;
            (plan.data)(self);
            if self.shutdown_requested {
                self.plan_queue.clear();
                break;
            }
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    define_data_plugin!(ComponentA, Vec<u32>, vec![]);

    fn add_plan(context: &mut Context, time: f64, value: u32) -> PlanId {
        context.add_plan(time, move |context| {
            context.get_data_mut(ComponentA).push(value);
        })
    }

    #[test]
    #[should_panic(expected = "Time -1 is invalid")]
    fn negative_plan_time() {
        let mut context = Context::new();
        add_plan(&mut context, -1.0, 0);
    }

    #[test]
    #[should_panic(expected = "is invalid")]
    fn nan_plan_time() {
        let mut context = Context::new();
        add_plan(&mut context, f64::NAN, 0);
    }

    #[test]
    fn empty_context() {
        let mut context = Context::new();
        context.execute();
        assert_eq!(context.get_current_time(), 0.0);
        assert!(context.get_data(ComponentA).is_none());
    }

    #[test]
    fn timed_plans_run_in_order() {
        let mut context = Context::new();
        add_plan(&mut context, 2.0, 2);
        add_plan(&mut context, 1.0, 1);
        context.execute();
        assert_eq!(context.get_current_time(), 2.0);
        assert_eq!(*context.get_data_mut(ComponentA), vec![1, 2]);
    }

    #[test]
    fn plan_schedules_next_plan() {
        let mut context = Context::new();
        context.add_plan(1.0, |context| {
            context.get_data_mut(ComponentA).push(1);
            add_plan(context, 2.0, 2);
        });
        context.execute();
        assert_eq!(context.get_current_time(), 2.0);
        assert_eq!(context.get_data(ComponentA), Some(&vec![1, 2]));
    }

    #[test]
    fn report_phase_sees_tick_at_same_time() {
        let mut context = Context::new();
        context.add_plan_with_phase(
            1.0,
            |context| {
                let seen = context.get_data_mut(ComponentA).len() as u32;
                context.get_data_mut(ComponentA).push(100 + seen);
            },
            ExecutionPhase::Last,
        );
        add_plan(&mut context, 1.0, 1);
        context.execute();
        assert_eq!(*context.get_data_mut(ComponentA), vec![1, 101]);
    }

    #[test]
    fn cancel_plan() {
        let mut context = Context::new();
        let to_cancel = add_plan(&mut context, 2.0, 1);
        context.add_plan(1.0, move |context| {
            context.cancel_plan(&to_cancel);
        });
        context.execute();
        assert_eq!(context.get_current_time(), 1.0);
        assert!(context.get_data(ComponentA).is_none());
    }

    #[test]
    fn shutdown_drops_pending_plans() {
        let mut context = Context::new();
        add_plan(&mut context, 1.0, 1);
        context.add_plan(1.5, Context::shutdown);
        add_plan(&mut context, 2.0, 2);
        context.execute();
        assert_eq!(context.get_current_time(), 1.5);
        assert_eq!(*context.get_data_mut(ComponentA), vec![1]);
    }
}
