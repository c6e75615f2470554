pub mod bincodec;
