mod integration {
    mod backup_tests;
    mod cleanup_tests;
    mod command_tests;
    mod restore_tests;
}
