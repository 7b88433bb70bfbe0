use cash_ir::Context;
use cash_utils::{CashResult, OutputFile};
use std::time::Instant;

/// All backends must implement this trait.
/// `Backend::name` returns the name of this backend.
/// `Backend::validate` should return `Ok(())` if the
/// design can be lowered and `Err(...)` otherwise.
/// `Backend::emit` writes the lowered design to `file`.
/// `Backend::run` is the composition of these two functions.
pub trait Backend {
    fn name(&self) -> &'static str;
    fn validate(&self, ctx: &Context) -> CashResult<()>;
    fn emit(&self, ctx: &Context, file: &mut OutputFile) -> CashResult<()>;
    fn run(&self, ctx: &Context, mut file: OutputFile) -> CashResult<()> {
        self.validate(ctx)?;
        let time = Instant::now();
        self.emit(ctx, &mut file)?;
        log::info!(
            "{}: generated `{}` in {:?}",
            self.name(),
            file,
            time.elapsed()
        );
        Ok(())
    }
}
