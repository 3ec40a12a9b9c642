mod helpers;

mod identity_tests;
