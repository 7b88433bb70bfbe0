use cash::driver;
use cash_utils::CashResult;

fn main() -> CashResult<()> {
    driver::run()
}
