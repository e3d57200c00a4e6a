fn main() {
    bj_solver::cli::run();
}
