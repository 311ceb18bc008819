pub mod slackdump;
