//! State-machine testing atop the generator/shrink core: a sequence of
//! commands is generated by threading a model through a
//! precondition-checked choice at each step, then shrunk with the same
//! chunk-removal-then-per-element strategy as any other sequence, with
//! shrink candidates whose preconditions no longer hold after a removal
//! discarded rather than reported.

use crate::generate::Gen;
use crate::shrink::Shrinkable;
use crate::strategy;
use std::fmt::Debug;
use std::rc::Rc;

/// A single step against a model/system-under-test pair: whether it
/// applies (`check`), how it updates the model's expectation (`apply`),
/// and how it runs against the real system (`run`).
pub trait Command<Model, Sut>: Debug {
    /// Whether this command may be chosen given the current model state.
    /// Defaults to always-applicable for commands with no precondition.
    fn check(&self, model: &Model) -> bool {
        let _ = model;
        true
    }

    /// Updates the model to reflect this command's expected effect.
    fn apply(&self, model: &mut Model);

    /// Executes this command against the real system.
    fn run(&self, sut: &mut Sut);
}

/// A generator that, given the current model, draws the next command to
/// run. Callers are expected to bias or filter this generator by
/// `Command::check` themselves (e.g. via [`Gen::such_that`]) so that
/// [`gen_commands`] only ever has to thread state, not reject choices.
pub type CommandGen<Model, Sut> = Gen<Rc<dyn Command<Model, Sut>>>;

/// A generated step sequence, as produced by [`gen_commands`].
pub type CommandSequence<Model, Sut> = Vec<Rc<dyn Command<Model, Sut>>>;

/// Replays `commands` against a fresh clone of `initial_model`,
/// returning whether every command's precondition held at the point it
/// was reached. Used to re-validate preconditions after a shrink removes
/// or replaces a command.
pub fn valid_sequence<Model, Sut>(initial_model: &Model, commands: &[Rc<dyn Command<Model, Sut>>]) -> bool
where
    Model: Clone,
{
    let mut model = initial_model.clone();
    for command in commands {
        if !command.check(&model) {
            return false;
        }
        command.apply(&mut model);
    }
    true
}

/// Runs `commands` against `sut` in order, updating a scratch model
/// alongside so commands that read back earlier model state (via
/// closures captured at generation time) see a consistent view.
pub fn run_sequence<Model, Sut>(initial_model: &Model, commands: &[Rc<dyn Command<Model, Sut>>], sut: &mut Sut)
where
    Model: Clone,
{
    let mut model = initial_model.clone();
    for command in commands {
        command.apply(&mut model);
        command.run(sut);
    }
}

/// Builds a generator of command sequences: at each step, `choose_command`
/// is asked for the next command given the model accumulated so far; the
/// chosen command's `apply` advances the model before the next step is
/// drawn. If `choose_command` cannot produce a value (its generator
/// discards), the sequence simply ends there rather than failing the
/// whole generation.
///
/// Shrinking uses the same chunk-removal-then-per-element strategy as
/// any other sequence, filtered so that a candidate whose preconditions
/// no longer hold against `initial_model` is never offered.
pub fn gen_commands<Model, Sut, F>(initial_model: Model, choose_command: F) -> Gen<CommandSequence<Model, Sut>>
where
    Model: Clone + 'static,
    Sut: 'static,
    F: Fn(&Model) -> CommandGen<Model, Sut> + Clone + 'static,
{
    Gen::from_fn(move |random, size| {
        let mut model = initial_model.clone();
        let length = random.usize(0..=size as usize);
        let mut items: Vec<Shrinkable<Rc<dyn Command<Model, Sut>>>> = Vec::with_capacity(length);
        for _ in 0..length {
            let (mut leaf, rest) = random.split();
            *random = rest;
            let gen = choose_command(&model);
            match gen.generate(&mut leaf, size) {
                Ok(tree) => {
                    let command = tree.value();
                    if !command.check(&model) {
                        break;
                    }
                    command.apply(&mut model);
                    items.push(tree);
                }
                Err(_) => break,
            }
        }
        let tree = strategy::container_tree(items);
        let validation_model = initial_model.clone();
        tree.clone()
            .filter(move |commands| valid_sequence(&validation_model, commands))
            .unwrap_or(tree)
    })
}

/// A sequence split into a shared prefix and two branches meant to be
/// run concurrently: each branch must be independently valid given only
/// the model state after the prefix, without assuming anything about the
/// other branch's intermediate states.
#[derive(Clone, Debug)]
pub struct ParallelCommands<Model, Sut> {
    pub prefix: CommandSequence<Model, Sut>,
    pub left: CommandSequence<Model, Sut>,
    pub right: CommandSequence<Model, Sut>,
}

/// Splits a generated sequence into a prefix and two roughly-equal
/// branches.
pub fn gen_parallel_commands<Model, Sut, F>(
    initial_model: Model,
    choose_command: F,
) -> Gen<ParallelCommands<Model, Sut>>
where
    Model: Clone + 'static,
    Sut: 'static,
    F: Fn(&Model) -> CommandGen<Model, Sut> + Clone + 'static,
{
    gen_commands(initial_model, choose_command).map(|sequence| {
        let split_at = sequence.len() / 2;
        let (prefix, rest) = sequence.split_at(split_at);
        let half = rest.len() / 2;
        let (left, right) = rest.split_at(half);
        ParallelCommands {
            prefix: prefix.to_vec(),
            left: left.to_vec(),
            right: right.to_vec(),
        }
    })
}

/// Whether `left` and `right` could each run on their own, independently,
/// starting from the model state reached after `prefix` — the precondition
/// [`ParallelCommands`] requires before the branches may be interleaved.
pub fn independent_branches<Model, Sut>(initial_model: &Model, parallel: &ParallelCommands<Model, Sut>) -> bool
where
    Model: Clone,
{
    let mut model = initial_model.clone();
    for command in &parallel.prefix {
        if !command.check(&model) {
            return false;
        }
        command.apply(&mut model);
    }
    valid_sequence(&model, &parallel.left) && valid_sequence(&model, &parallel.right)
}

/// Enumerates every way to interleave `left_len` left-branch steps with
/// `right_len` right-branch steps, as `true`-for-left / `false`-for-right
/// sequences — the single-threaded stand-in for genuinely concurrent
/// execution: a caller replays each interleaving sequentially against a
/// fresh model/sut and accepts the branch pair if at least one succeeds.
pub fn interleavings(left_len: usize, right_len: usize) -> Vec<Vec<bool>> {
    fn recur(left: usize, right: usize, path: &mut Vec<bool>, out: &mut Vec<Vec<bool>>) {
        if left == 0 && right == 0 {
            out.push(path.clone());
            return;
        }
        if left > 0 {
            path.push(true);
            recur(left - 1, right, path, out);
            path.pop();
        }
        if right > 0 {
            path.push(false);
            recur(left, right - 1, path, out);
            path.pop();
        }
    }
    let mut out = Vec::new();
    recur(left_len, right_len, &mut Vec::new(), &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::in_range;
    use crate::random::Random;

    #[derive(Debug)]
    struct Push(i32);

    #[derive(Debug)]
    struct Pop;

    impl Command<Vec<i32>, Vec<i32>> for Push {
        fn apply(&self, model: &mut Vec<i32>) {
            model.push(self.0);
        }

        fn run(&self, sut: &mut Vec<i32>) {
            sut.push(self.0);
        }
    }

    impl Command<Vec<i32>, Vec<i32>> for Pop {
        fn check(&self, model: &Vec<i32>) -> bool {
            !model.is_empty()
        }

        fn apply(&self, model: &mut Vec<i32>) {
            model.pop();
        }

        fn run(&self, sut: &mut Vec<i32>) {
            sut.pop();
        }
    }

    fn choose(model: &Vec<i32>) -> CommandGen<Vec<i32>, Vec<i32>> {
        let can_pop = !model.is_empty();
        let push: CommandGen<Vec<i32>, Vec<i32>> =
            in_range(0i32, 100).map(|value| Rc::new(Push(value)) as Rc<dyn Command<Vec<i32>, Vec<i32>>>);
        if can_pop {
            let pop: CommandGen<Vec<i32>, Vec<i32>> =
                Gen::just(Rc::new(Pop) as Rc<dyn Command<Vec<i32>, Vec<i32>>>);
            crate::generate::one_of(vec![push, pop])
        } else {
            push
        }
    }

    #[test]
    fn generated_sequences_are_always_valid() {
        let gen = gen_commands(Vec::<i32>::new(), choose);
        let mut random = Random::from_seed(1);
        for case in 0..20u32 {
            let tree = gen.generate(&mut random, 10 + case).expect("infallible choose");
            assert!(valid_sequence(&Vec::new(), &tree.value()));
        }
    }

    #[test]
    fn model_and_sut_agree_after_running_a_sequence() {
        let gen = gen_commands(Vec::<i32>::new(), choose);
        let mut random = Random::from_seed(2);
        let tree = gen.generate(&mut random, 20).expect("infallible choose");
        let commands = tree.value();
        let mut model = Vec::new();
        let mut sut = Vec::new();
        run_sequence(&Vec::new(), &commands, &mut sut);
        for command in &commands {
            command.apply(&mut model);
        }
        assert_eq!(model, sut);
    }

    #[test]
    fn interleavings_counts_match_binomial_coefficient() {
        let all = interleavings(2, 1);
        assert_eq!(all.len(), 3);
        for path in &all {
            assert_eq!(path.iter().filter(|&&is_left| is_left).count(), 2);
            assert_eq!(path.iter().filter(|&&is_left| !is_left).count(), 1);
        }
    }
}
