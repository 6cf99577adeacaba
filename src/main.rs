fn main() {
    kde_cluster::cli::run();
}
