mod helpers;

mod codec_tests;
